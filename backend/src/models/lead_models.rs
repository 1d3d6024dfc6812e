use serde::Deserialize;
use thiserror::Error;

/// One row of the lead sheet: timestamp in column A, name in column B
/// (blank for newsletter-only signups), email in column C.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub timestamp: String,
    pub name: String,
    pub email: String,
}

/// Which email template the submission asked for. Absent in the request
/// body means the default coupon flow.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadFlow {
    Download,
    Waitlist,
}

#[derive(Debug, PartialEq)]
pub enum ReconcileOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, PartialEq)]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credentials rejected: {0}")]
    Auth(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("sheets api returned {status}: {message}")]
    Api { status: u16, message: String },
}
