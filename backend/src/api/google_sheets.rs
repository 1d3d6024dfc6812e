use std::env;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use crate::models::lead_models::{SheetRow, StoreError};
use crate::repositories::lead_repository::LeadStore;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Google Sheets v4 values client authenticated as a service account.
/// The bearer token is cached until shortly before it expires.
pub struct SheetsClient {
    http: reqwest::Client,
    spreadsheet_id: String,
    sheet_name: String,
    client_email: String,
    private_key: String,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: i64,
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl SheetsClient {
    pub fn from_env() -> Self {
        Self {
            http: reqwest::Client::new(),
            spreadsheet_id: env::var("GOOGLE_SHEET_ID").expect("GOOGLE_SHEET_ID must be set"),
            sheet_name: env::var("LEADS_SHEET_NAME").expect("LEADS_SHEET_NAME must be set"),
            client_email: env::var("GOOGLE_SERVICE_ACCOUNT_EMAIL")
                .expect("GOOGLE_SERVICE_ACCOUNT_EMAIL must be set"),
            // The key arrives with escaped newlines when set through a .env file
            private_key: env::var("GOOGLE_PRIVATE_KEY")
                .expect("GOOGLE_PRIVATE_KEY must be set")
                .replace("\\n", "\n"),
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        let now = Utc::now().timestamp();
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at - 60 > now {
                return Ok(cached.value.clone());
            }
        }

        let claims = Claims {
            iss: &self.client_email,
            scope: SHEETS_SCOPE,
            aud: TOKEN_URL,
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| StoreError::Auth(format!("invalid service account key: {}", e)))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| StoreError::Auth(format!("failed to sign token request: {}", e)))?;

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!(
                "token exchange failed with {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        let value = token.access_token.clone();
        *guard = Some(CachedToken {
            value: token.access_token,
            expires_at: now + token.expires_in,
        });
        Ok(value)
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}{}",
            self.spreadsheet_id,
            urlencoding::encode(range),
            suffix
        )
    }
}

async fn api_error(response: reqwest::Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);
    StoreError::Api { status, message }
}

impl LeadStore for SheetsClient {
    async fn email_column(&self) -> Result<Vec<String>, StoreError> {
        let token = self.access_token().await?;
        let range = format!("{}!C:C", self.sheet_name);
        let response = self
            .http
            .get(self.values_url(&range, ""))
            .bearer_auth(&token)
            .send()
            .await?;
        if !response.status().is_success() {
            let err = api_error(response).await;
            // An untouched sheet has no parseable C:C range; that means no rows yet.
            if let StoreError::Api { status: 400, message } = &err {
                if message.contains("Unable to parse range") {
                    tracing::info!("lead sheet empty, treating as no existing rows");
                    return Ok(Vec::new());
                }
            }
            return Err(err);
        }

        let range: ValueRange = response.json().await?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect())
    }

    async fn append_row(&self, row: SheetRow) -> Result<(), StoreError> {
        let token = self.access_token().await?;
        let range = format!("{}!A:C", self.sheet_name);
        let url = self.values_url(
            &range,
            ":append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&json!({ "values": [[row.timestamp, row.name, row.email]] }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    async fn update_name(&self, row_number: u32, name: &str) -> Result<(), StoreError> {
        let token = self.access_token().await?;
        let range = format!("{}!B{}", self.sheet_name, row_number);
        let url = self.values_url(&range, "?valueInputOption=USER_ENTERED");
        let response = self
            .http
            .put(url)
            .bearer_auth(&token)
            .json(&json!({ "values": [[name]] }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }
}
