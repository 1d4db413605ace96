use crate::config::Config;
use crate::deal_models::{
    DispatchRequest, DocumentCreationRequest, DocumentCreationResponse, SignerEntry,
    SignerListRequest,
};
use crate::errors::{AppError, UpstreamError};
use reqwest::{Response, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Client for the D4Sign document API.
///
/// Credentials travel as query parameters (`tokenAPI`, `cryptKey`), as D4Sign
/// requires. They are redacted from every log line.
#[derive(Clone)]
pub struct D4SignClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    crypt_key: Option<String>,
    coffer_uuid: String,
}

impl D4SignClient {
    /// Creates a new `D4SignClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded configuration (base URL, credentials, coffer, timeout).
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.d4sign_timeout_secs))
            .user_agent(concat!("clint-d4sign/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to create D4Sign client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.d4sign_base_url.trim_end_matches('/').to_string(),
            token: config.d4sign_token.clone(),
            crypt_key: config.d4sign_crypt_key.clone(),
            coffer_uuid: config.d4sign_coffer_uuid.clone(),
        })
    }

    /// Creates a document in the configured coffer from a Word template.
    ///
    /// # Returns
    ///
    /// * `Result<String, UpstreamError>` - The UUID of the created document.
    pub async fn create_document_from_template(
        &self,
        request: &DocumentCreationRequest,
    ) -> Result<String, UpstreamError> {
        let path = format!("documents/{}/makedocumentbytemplateword", self.coffer_uuid);
        tracing::info!("Creating document '{}' in D4Sign", request.name_document);

        let response = self.post(&path, request).await?;
        let response = Self::ensure_success(response).await?;

        let created: DocumentCreationResponse = response.json().await.map_err(|e| {
            UpstreamError::transport(format!("Failed to parse D4Sign document response: {}", e))
        })?;

        match created.document_uuid() {
            Some(uuid) => {
                tracing::info!("✓ Document created: {}", uuid);
                Ok(uuid.to_string())
            }
            None => {
                tracing::warn!("Unexpected D4Sign response format: {:?}", created.raw);
                Err(UpstreamError {
                    message: "Document creation response missing 'uuid' field".to_string(),
                    status: None,
                    details: Some(Value::Object(created.raw)),
                })
            }
        }
    }

    /// Registers the signer list of a document.
    pub async fn register_signers(
        &self,
        document_uuid: &str,
        signers: &[SignerEntry],
    ) -> Result<(), UpstreamError> {
        let path = format!("documents/{}/createlist", document_uuid);
        tracing::info!(
            "Registering {} signer(s) on document {}",
            signers.len(),
            document_uuid
        );

        let response = self.post(&path, &SignerListRequest { signers }).await?;
        Self::ensure_success(response).await?;

        let emails: Vec<&str> = signers.iter().map(|s| s.email.as_str()).collect();
        tracing::info!("✓ Signers registered: {}", emails.join(", "));
        Ok(())
    }

    /// Sends the document to its signers.
    pub async fn send_to_signer(
        &self,
        document_uuid: &str,
        dispatch: &DispatchRequest,
    ) -> Result<(), UpstreamError> {
        let path = format!("documents/{}/sendtosigner", document_uuid);
        tracing::info!("Sending document {} for signature", document_uuid);

        let response = self.post(&path, dispatch).await?;
        Self::ensure_success(response).await?;

        tracing::info!("✓ Document {} sent for signature", document_uuid);
        Ok(())
    }

    /// Builds the full endpoint URL with query credentials.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, UpstreamError> {
        let mut params = vec![("tokenAPI", self.token.as_str())];
        if let Some(ref key) = self.crypt_key {
            params.push(("cryptKey", key.as_str()));
        }

        Url::parse_with_params(&format!("{}/{}", self.base_url, path), &params)
            .map_err(|e| UpstreamError::transport(format!("Failed to build URL: {}", e)))
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, UpstreamError> {
        let url = self.endpoint(path)?;
        // Redact credentials from logs to prevent leaking them
        tracing::debug!("POST {}/{}?tokenAPI=[REDACTED]", self.base_url, path);
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(payload) = serde_json::to_string(body) {
                tracing::debug!("Payload: {}", payload);
            }
        }

        Ok(self.client.post(url).json(body).send().await?)
    }

    /// Turns non-2xx responses into an `UpstreamError` with the payload attached.
    async fn ensure_success(response: Response) -> Result<Response, UpstreamError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let details =
            serde_json::from_str(&error_text).unwrap_or_else(|_| Value::String(error_text));
        tracing::error!("D4Sign returned error {}: {}", status, details);

        Err(UpstreamError::status(status.as_u16(), details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(crypt_key: Option<&str>) -> Config {
        Config {
            port: 3000,
            d4sign_base_url: "https://sandbox.d4sign.com.br/api/v1/".to_string(),
            d4sign_token: "live_abc".to_string(),
            d4sign_crypt_key: crypt_key.map(str::to_string),
            d4sign_coffer_uuid: "coffer-1".to_string(),
            d4sign_template_id: "tpl-1".to_string(),
            approver_email: None,
            d4sign_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = D4SignClient::new(&test_config(None));
        assert!(client.is_ok());
    }

    #[test]
    fn test_endpoint_without_crypt_key() {
        let client = D4SignClient::new(&test_config(None)).unwrap();
        let url = client.endpoint("documents/abc/createlist").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sandbox.d4sign.com.br/api/v1/documents/abc/createlist?tokenAPI=live_abc"
        );
    }

    #[test]
    fn test_endpoint_with_crypt_key() {
        let client = D4SignClient::new(&test_config(Some("live_crypt"))).unwrap();
        let url = client.endpoint("documents/abc/sendtosigner").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("tokenAPI".to_string(), "live_abc".to_string()),
                ("cryptKey".to_string(), "live_crypt".to_string()),
            ]
        );
    }
}
