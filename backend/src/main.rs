use dotenvy::dotenv;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{TraceLayer, DefaultMakeSpan, DefaultOnResponse};
use tracing::Level;
use std::sync::Arc;

mod handlers {
    pub mod lead_handlers;
    pub mod lead_dtos;
}
mod api {
    pub mod google_sheets;
    pub mod mailjet;
}
mod models {
    pub mod lead_models;
}
mod repositories {
    pub mod lead_repository;
}

use api::google_sheets::SheetsClient;
use handlers::lead_handlers;
use repositories::lead_repository::LeadRepository;

async fn health_check() -> &'static str {
    "OK"
}

pub struct AppState {
    lead_repository: LeadRepository<SheetsClient>,
}

pub fn validate_env() {
    let _ = std::env::var("GOOGLE_SERVICE_ACCOUNT_EMAIL")
        .expect("GOOGLE_SERVICE_ACCOUNT_EMAIL must be set");
    let _ = std::env::var("GOOGLE_PRIVATE_KEY")
        .expect("GOOGLE_PRIVATE_KEY must be set");
    let _ = std::env::var("GOOGLE_SHEET_ID")
        .expect("GOOGLE_SHEET_ID must be set");
    let _ = std::env::var("LEADS_SHEET_NAME")
        .expect("LEADS_SHEET_NAME must be set");
    let _ = std::env::var("MAILJET_API_KEY")
        .expect("MAILJET_API_KEY must be set");
    let _ = std::env::var("MAILJET_SECRET_KEY")
        .expect("MAILJET_SECRET_KEY must be set");
    let _ = std::env::var("SENDER_EMAIL")
        .expect("SENDER_EMAIL must be set");
    let _ = std::env::var("COUPON_CODE")
        .expect("COUPON_CODE must be set");
    let _ = std::env::var("ENVIRONMENT") // for dev its 'development' and for prod anything else
        .expect("ENVIRONMENT must be set");
    let _ = std::env::var("FRONTEND_URL") // frontend url
        .expect("FRONTEND_URL must be set");
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    validate_env();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let state = Arc::new(AppState {
        lead_repository: LeadRepository::new(SheetsClient::from_env()),
    });

    // Create router with CORS
    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/leads/submit", post(lead_handlers::submit_lead))
        .route("/api/newsletter/subscribe", post(lead_handlers::subscribe_newsletter))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
        )
        .layer(
            CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_origin(Any) // Be cautious with `Any` in production; restrict to your frontend origin
                .allow_headers([axum::http::header::CONTENT_TYPE])
        )
        .with_state(state);

    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:3001").await.unwrap();
    axum::serve(listener, app.into_make_service()).await.unwrap();
}
