use crate::config::Config;
use crate::d4sign_client::D4SignClient;
use crate::deal_models::{
    build_signers, DealEvent, DispatchRequest, DocumentCreationRequest, WebhookResponse,
};
use crate::errors::AppError;
use crate::handlers::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

/// Clint Webhook Handler
///
/// Receives the deal event Clint fires when a deal reaches the contract stage
/// and turns it into a D4Sign envelope:
///
/// 1. Create the contract from the configured template.
/// 2. Register signers (approver first when configured, then the contact).
/// 3. Send the document for signature.
///
/// The steps run strictly in order and the first failure aborts the rest.
/// Nothing is rolled back: a failure after step 1 leaves the document
/// created in the coffer but unsent.
///
/// The body is read raw: anything other than a JSON object is treated as an
/// empty event and answered with the missing-field diagnostic.
pub async fn clint_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<WebhookResponse>), AppError> {
    tracing::info!("Received Clint webhook");
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let event = DealEvent::from_request_body(content_type, &body);
    tracing::debug!(
        "Deal event: {}",
        serde_json::to_string(&event).unwrap_or_default()
    );

    let document_uuid = process_deal(&state.d4sign, &state.config, &event).await?;

    Ok((
        StatusCode::OK,
        Json(WebhookResponse {
            success: true,
            message: "Automação concluída!".to_string(),
            document_uuid,
        }),
    ))
}

/// Runs the three-step signing flow for one deal.
///
/// # Returns
///
/// * `Result<String, AppError>` - The UUID of the dispatched document.
pub async fn process_deal(
    d4sign: &D4SignClient,
    config: &Config,
    event: &DealEvent,
) -> Result<String, AppError> {
    let contact = event.validate()?;

    tracing::info!("Step 1: creating document for {}", contact.name);
    let request = DocumentCreationRequest::from_event(event, &contact, &config.d4sign_template_id);
    let document_uuid = d4sign
        .create_document_from_template(&request)
        .await
        .map_err(AppError::DocumentCreationFailed)?;

    tracing::info!("Step 2: registering signers on {}", document_uuid);
    let signers = build_signers(config.approver_email.as_deref(), &contact.email);
    d4sign
        .register_signers(&document_uuid, &signers)
        .await
        .map_err(|e| {
            tracing::warn!("Document {} left created but unsent", document_uuid);
            AppError::SignerRegistrationFailed(e)
        })?;

    tracing::info!("Step 3: dispatching {} for signature", document_uuid);
    let dispatch = DispatchRequest::for_contact(&contact, event.plan_name().as_deref());
    d4sign
        .send_to_signer(&document_uuid, &dispatch)
        .await
        .map_err(|e| {
            tracing::warn!("Document {} left created but unsent", document_uuid);
            AppError::DispatchFailed(e)
        })?;

    tracing::info!(
        "✅ Contract {} sent to {} for signature",
        document_uuid,
        contact.email
    );
    Ok(document_uuid)
}
