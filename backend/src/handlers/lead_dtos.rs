use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::models::lead_models::LeadFlow;

// Same loose shape check the forms apply client side.
static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email regex"));

#[derive(Debug, Deserialize)]
pub struct SubmitLeadRequest {
    pub name: String,
    pub email: String,
    #[serde(rename = "flowType", default)]
    pub flow_type: Option<LeadFlow>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}
