use crate::config::Config;
use crate::d4sign_client::D4SignClient;
use axum::{http::StatusCode, Json};
use chrono::Utc;
use serde_json::json;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, read once at startup.
    pub config: Config,
    /// Client for the D4Sign API.
    pub d4sign: D4SignClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, crate::errors::AppError> {
        let d4sign = D4SignClient::new(&config)?;
        Ok(Self { config, d4sign })
    }
}

/// Liveness check.
pub async fn root() -> &'static str {
    "Automação Clint <> D4Sign está rodando! ✅"
}

/// Health check endpoint.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with status and current timestamp.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}
