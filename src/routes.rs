use crate::handlers::{self, AppState};
use crate::webhook_handler;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Largest deal event accepted from Clint.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 1024 * 1024;

/// Liveness routes. Never rate limited so platform probes always get through.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
}

/// Routes receiving CRM traffic.
pub fn webhook_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhook", post(webhook_handler::clint_webhook))
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(MAX_WEBHOOK_BODY_BYTES)))
}

/// Full application without rate limiting; `main` adds the limiter in front
/// of [`webhook_routes`].
pub fn create_router(state: Arc<AppState>) -> Router {
    public_routes()
        .merge(webhook_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
