use std::env;
use std::error::Error;

use reqwest::Client;
use serde_json::json;

use crate::models::lead_models::LeadFlow;

const SEND_URL: &str = "https://api.mailjet.com/v3.1/send";

/// Send the confirmation email for a captured lead. Failures here are the
/// caller's to log; the sheet write stays the source of truth.
pub async fn send_lead_email(name: &str, email: &str, flow: LeadFlow) -> Result<(), Box<dyn Error>> {
    let api_key = env::var("MAILJET_API_KEY")?;
    let secret_key = env::var("MAILJET_SECRET_KEY")?;
    let sender_email = env::var("SENDER_EMAIL")?;
    let sender_name = env::var("SENDER_NAME").unwrap_or_else(|_| "The Team".to_string());
    let coupon_code = env::var("COUPON_CODE")?;

    let (subject, text_part, html_part) = render_template(flow, name, &coupon_code);

    let response = Client::new()
        .post(SEND_URL)
        .basic_auth(&api_key, Some(&secret_key))
        .json(&json!({
            "Messages": [{
                "From": { "Email": sender_email, "Name": sender_name },
                "To": [{ "Email": email, "Name": name }],
                "Subject": subject,
                "TextPart": text_part,
                "HTMLPart": html_part,
            }]
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("mailjet send failed with {}: {}", status, body).into());
    }
    Ok(())
}

fn render_template(flow: LeadFlow, name: &str, coupon_code: &str) -> (String, String, String) {
    match flow {
        LeadFlow::Download => (
            "Your Coupon Code!".to_string(),
            format!(
                "Hi {},\n\nThanks for your interest! Here is your coupon code: {}",
                name, coupon_code
            ),
            format!(
                "<h3>Hi {},</h3><p>Thanks for your interest! Here is your coupon code: <strong>{}</strong></p>",
                name, coupon_code
            ),
        ),
        LeadFlow::Waitlist => (
            "You're on the list!".to_string(),
            format!(
                "Hi {},\n\nThanks for joining the waitlist. We'll let you know the moment we launch.",
                name
            ),
            format!(
                "<h3>Hi {},</h3><p>Thanks for joining the waitlist. We'll let you know the moment we launch.</p>",
                name
            ),
        ),
    }
}
