use crate::errors::AppError;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Deal Event field → D4Sign template placeholder.
pub const FIELD_MAPPING: [(&str, &str); 10] = [
    ("contact_name", "NOME_CLIENTE"),
    ("contact_doc", "CPF_CNPJ"),
    ("contact_nacionalidade", "NACIONALIDADE"),
    ("contact_data_de_nascimento", "DATA_NASCIMENTO"),
    ("contact_endereco", "ENDERECO"),
    ("contact_email", "EMAIL"),
    ("deal_value", "VALOR"),
    ("deal_modalidade", "FIDELIDADE"),
    ("deal_plano_de_assinatura", "NOME_PLANO"),
    ("deal_trial", "TRIAL"),
];

/// Deal Event sent by Clint when a deal reaches the contract stage.
///
/// Kept as a raw JSON object: only `contact_name` and `contact_email` are
/// validated, everything else is passed through to the template as received.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DealEvent {
    pub fields: Map<String, Value>,
}

/// Contact data guaranteed present after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedContact {
    pub name: String,
    pub email: String,
}

impl DealEvent {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Decodes a raw webhook body.
    ///
    /// Only a JSON object sent as JSON is read; any other body (wrong content
    /// type, empty, malformed, array, scalar) yields an empty event so that
    /// validation reports the missing fields.
    pub fn from_request_body(content_type: Option<&str>, body: &[u8]) -> Self {
        let is_json = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|mime| {
                let mime = mime.trim().to_ascii_lowercase();
                mime == "application/json" || mime.ends_with("+json")
            })
            .unwrap_or(false);
        if !is_json {
            tracing::warn!("Webhook body ignored: content type {:?} is not JSON", content_type);
            return Self::default();
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => Self { fields },
            Ok(other) => {
                tracing::warn!("Webhook body is not a JSON object: {}", other);
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Webhook body is not valid JSON: {}", e);
                Self::default()
            }
        }
    }

    /// Checks the two required fields.
    pub fn validate(&self) -> Result<ValidatedContact, AppError> {
        let name = self
            .required_text("contact_name")
            .ok_or(AppError::MissingRequiredField("contact_name"))?;
        let email = self
            .required_text("contact_email")
            .ok_or(AppError::MissingRequiredField("contact_email"))?;

        Ok(ValidatedContact { name, email })
    }

    /// Non-blank text value of a field.
    ///
    /// Non-zero numbers are accepted and rendered; zero is rejected like the
    /// CRM's other empty values. Booleans, arrays and objects are rejected.
    fn required_text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64().map_or(true, |f| f != 0.0) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Placeholder map for the contract template.
    ///
    /// Fields missing from the event are left out of the map.
    pub fn template_fields(&self) -> Map<String, Value> {
        FIELD_MAPPING
            .iter()
            .filter_map(|(field, placeholder)| {
                self.fields
                    .get(*field)
                    .map(|value| (placeholder.to_string(), value.clone()))
            })
            .collect()
    }

    /// Subscription plan name, if the CRM sent one.
    pub fn plan_name(&self) -> Option<String> {
        match self.fields.get("deal_plano_de_assinatura")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Null | Value::String(_) => None,
            other => Some(other.to_string()),
        }
    }
}

/// Body of `makedocumentbytemplateword`.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentCreationRequest {
    pub name_document: String,
    /// Keyed by template id; D4Sign accepts several templates per call.
    pub templates: Map<String, Value>,
}

impl DocumentCreationRequest {
    pub fn from_event(event: &DealEvent, contact: &ValidatedContact, template_id: &str) -> Self {
        let mut templates = Map::new();
        templates.insert(
            template_id.to_string(),
            Value::Object(event.template_fields()),
        );

        Self {
            name_document: format!("Contrato - {}", contact.name),
            templates,
        }
    }
}

/// Response of `makedocumentbytemplateword`.
///
/// The sandbox answers with `uuid`, some production accounts with
/// `uuid_document`.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentCreationResponse {
    pub uuid: Option<String>,
    pub uuid_document: Option<String>,

    /// Raw data for any additional fields
    #[serde(flatten)]
    pub raw: Map<String, Value>,
}

impl DocumentCreationResponse {
    pub fn document_uuid(&self) -> Option<&str> {
        self.uuid
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.uuid_document.as_deref().filter(|s| !s.is_empty()))
    }
}

/// D4Sign "act" code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignerRole {
    #[serde(rename = "1")]
    Signatory,
    #[serde(rename = "2")]
    Approver,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignerEntry {
    pub email: String,
    #[serde(rename = "act")]
    pub role: SignerRole,
    #[serde(serialize_with = "serialize_flag")]
    pub foreign: bool,
}

fn serialize_flag<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *flag { "1" } else { "0" })
}

/// Approver first (when configured) so workflow ordering makes them act
/// before the contact.
pub fn build_signers(approver_email: Option<&str>, contact_email: &str) -> Vec<SignerEntry> {
    let mut signers = Vec::with_capacity(2);
    if let Some(approver) = approver_email {
        signers.push(SignerEntry {
            email: approver.to_string(),
            role: SignerRole::Approver,
            foreign: false,
        });
    }
    signers.push(SignerEntry {
        email: contact_email.to_string(),
        role: SignerRole::Signatory,
        foreign: false,
    });
    signers
}

/// Body of `createlist`.
#[derive(Debug, Clone, Serialize)]
pub struct SignerListRequest<'a> {
    pub signers: &'a [SignerEntry],
}

/// Body of `sendtosigner`.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRequest {
    pub message: String,
    #[serde(serialize_with = "serialize_flag")]
    pub skip_email: bool,
    #[serde(serialize_with = "serialize_flag")]
    pub workflow: bool,
}

impl DispatchRequest {
    pub fn for_contact(contact: &ValidatedContact, plan_name: Option<&str>) -> Self {
        let message = match plan_name {
            Some(plan) => format!(
                "Olá {}! Segue o contrato do plano {} para sua assinatura.",
                contact.name, plan
            ),
            None => format!(
                "Olá {}! Segue o contrato para sua assinatura.",
                contact.name
            ),
        };

        Self {
            message,
            skip_email: false,
            workflow: true,
        }
    }
}

/// Response sent back to Clint on success
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    pub document_uuid: String,
}
