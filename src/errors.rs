use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::fmt;

/// Message returned to the CRM for any downstream failure.
pub const AUTOMATION_FAILED_MESSAGE: &str = "Erro ao processar a automação.";

/// Failure reported by the D4Sign API (or by the transport in front of it).
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamError {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// HTTP status returned by D4Sign, when a response was received.
    pub status: Option<u16>,
    /// Response payload returned by D4Sign, when one was received.
    pub details: Option<Value>,
}

impl UpstreamError {
    /// An error raised before any response was received (connect, timeout, ...).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            details: None,
        }
    }

    /// A non-success response from D4Sign.
    pub fn status(status: u16, details: Value) -> Self {
        Self {
            message: format!("D4Sign returned status {}", status),
            status: Some(status),
            details: Some(details),
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// A required Deal Event field is absent or empty.
    MissingRequiredField(&'static str),
    /// Step 1: the document could not be created from the template.
    DocumentCreationFailed(UpstreamError),
    /// Step 2: the signer list could not be registered.
    SignerRegistrationFailed(UpstreamError),
    /// Step 3: the document could not be sent for signature.
    DispatchFailed(UpstreamError),
    /// Internal server error.
    InternalError(String),
}

impl AppError {
    /// Name of the pipeline step that failed, for logging.
    pub fn step(&self) -> Option<&'static str> {
        match self {
            AppError::DocumentCreationFailed(_) => Some("create_document"),
            AppError::SignerRegistrationFailed(_) => Some("register_signers"),
            AppError::DispatchFailed(_) => Some("send_to_signer"),
            AppError::MissingRequiredField(_) | AppError::InternalError(_) => None,
        }
    }

    fn upstream(&self) -> Option<&UpstreamError> {
        match self {
            AppError::DocumentCreationFailed(e)
            | AppError::SignerRegistrationFailed(e)
            | AppError::DispatchFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MissingRequiredField(field) => {
                write!(f, "Missing required field: {}", field)
            }
            AppError::DocumentCreationFailed(e) => write!(f, "Document creation failed: {}", e),
            AppError::SignerRegistrationFailed(e) => {
                write!(f, "Signer registration failed: {}", e)
            }
            AppError::DispatchFailed(e) => write!(f, "Dispatch for signature failed: {}", e),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Input defects become `400` with a plain-text diagnostic. Every other
    /// variant becomes `500` with an opaque JSON message; the upstream payload
    /// is attached as `details` when D4Sign returned one.
    fn into_response(self) -> Response {
        if let AppError::MissingRequiredField(field) = &self {
            tracing::warn!("Rejected deal event: '{}' is missing or empty", field);
            let diagnostic = format!(
                "Dados incompletos: campo '{}' ausente. Verifique o mapeamento de campos na Clint.",
                field
            );
            return (StatusCode::BAD_REQUEST, diagnostic).into_response();
        }

        match self.upstream() {
            Some(upstream) => tracing::error!(
                step = self.step().unwrap_or("unknown"),
                status = ?upstream.status,
                details = ?upstream.details,
                "{}",
                self
            ),
            None => tracing::error!("{}", self),
        }

        let mut body = json!({
            "success": false,
            "error": AUTOMATION_FAILED_MESSAGE,
        });
        if let Some(details) = self.upstream().and_then(|u| u.details.clone()) {
            body["details"] = details;
        }

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for UpstreamError {
    /// Converts a `reqwest::Error` into an `UpstreamError`.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::transport(format!("D4Sign request timed out: {}", err))
        } else {
            UpstreamError::transport(format!("D4Sign request failed: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request_text() {
        let response = AppError::MissingRequiredField("contact_email").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = String::from_utf8(body_of(response).await).unwrap();
        assert!(body.contains("contact_email"));
    }

    #[tokio::test]
    async fn test_upstream_failure_carries_details() {
        let err = AppError::SignerRegistrationFailed(UpstreamError::status(
            400,
            json!({"message": "Invalid e-mail"}),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], AUTOMATION_FAILED_MESSAGE);
        assert_eq!(body["details"]["message"], "Invalid e-mail");
    }

    #[tokio::test]
    async fn test_transport_failure_has_no_details() {
        let err = AppError::DispatchFailed(UpstreamError::transport("connection refused"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_step_names() {
        let e = UpstreamError::transport("x");
        assert_eq!(
            AppError::DocumentCreationFailed(e.clone()).step(),
            Some("create_document")
        );
        assert_eq!(AppError::DispatchFailed(e).step(), Some("send_to_signer"));
        assert_eq!(AppError::MissingRequiredField("contact_name").step(), None);
    }
}
