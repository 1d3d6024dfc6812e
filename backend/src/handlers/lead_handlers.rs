use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;

use crate::api::mailjet;
use crate::handlers::lead_dtos::{is_valid_email, SubmitLeadRequest, SubscribeRequest};
use crate::models::lead_models::{LeadFlow, SubscribeOutcome};
use crate::AppState;

pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitLeadRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let name = req.name.trim();
    let email = req.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing name or email"})),
        ));
    }
    if !is_valid_email(email) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing or invalid email"})),
        ));
    }

    match state.lead_repository.reconcile(name, email).await {
        Ok(outcome) => {
            tracing::info!("lead {} reconciled: {:?}", email, outcome);
            // Best effort only: the sheet write already succeeded, so a
            // failed email is logged and the request still reports success.
            let flow = req.flow_type.unwrap_or(LeadFlow::Download);
            if let Err(e) = mailjet::send_lead_email(name, email, flow).await {
                tracing::error!("confirmation email to {} failed: {}", email, e);
            }
            Ok(Json(json!({"message": "Data successfully submitted!"})))
        }
        Err(e) => {
            tracing::error!("failed to reconcile lead {}: {}", email, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to process submission."})),
            ))
        }
    }
}

pub async fn subscribe_newsletter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let email = req.email.trim();
    if !is_valid_email(email) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing or invalid email"})),
        ));
    }

    match state.lead_repository.subscribe(email).await {
        Ok(SubscribeOutcome::AlreadySubscribed) => {
            tracing::info!("newsletter signup for already-subscribed {}", email);
            Ok(Json(json!({"message": "Email is already subscribed."})))
        }
        Ok(SubscribeOutcome::Subscribed) => {
            tracing::info!("newsletter subscription added for {}", email);
            Ok(Json(json!({"message": "Successfully subscribed!"})))
        }
        Err(e) => {
            tracing::error!("newsletter subscription for {} failed: {}", email, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Subscription failed. Please try again later."})),
            ))
        }
    }
}
