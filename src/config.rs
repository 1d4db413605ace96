use serde::Deserialize;

/// D4Sign sandbox API root.
pub const D4SIGN_SANDBOX_URL: &str = "https://sandbox.d4sign.com.br/api/v1";
/// D4Sign production API root.
pub const D4SIGN_PRODUCTION_URL: &str = "https://secure.d4sign.com.br/api/v1";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub d4sign_base_url: String,
    pub d4sign_token: String,
    pub d4sign_crypt_key: Option<String>, // Only sent when the safe requires it
    pub d4sign_coffer_uuid: String,
    pub d4sign_template_id: String,
    pub approver_email: Option<String>,
    pub d4sign_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Blank values are treated exactly like missing ones.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let d4sign_base_url = match get("D4SIGN_BASE_URL") {
            Some(url) => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("D4SIGN_BASE_URL must start with http:// or https://");
                }
                url.trim_end_matches('/').to_string()
            }
            None => match get("D4SIGN_ENV").as_deref().map(str::trim) {
                None | Some("sandbox") => D4SIGN_SANDBOX_URL.to_string(),
                Some("production") => D4SIGN_PRODUCTION_URL.to_string(),
                Some(other) => anyhow::bail!(
                    "D4SIGN_ENV must be 'sandbox' or 'production', got '{}'",
                    other
                ),
            },
        };

        let config = Self {
            port: get("PORT")
                .map(|p| p.trim().parse::<u16>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?
                .unwrap_or(DEFAULT_PORT),
            d4sign_base_url,
            d4sign_token: get("D4SIGN_TOKEN")
                .ok_or_else(|| anyhow::anyhow!("D4SIGN_TOKEN environment variable required"))?,
            d4sign_crypt_key: get("D4SIGN_CRYPT_KEY"),
            d4sign_coffer_uuid: get("D4SIGN_COFFER_UUID").ok_or_else(|| {
                anyhow::anyhow!("D4SIGN_COFFER_UUID environment variable required")
            })?,
            d4sign_template_id: get("D4SIGN_TEMPLATE_ID").ok_or_else(|| {
                anyhow::anyhow!("D4SIGN_TEMPLATE_ID environment variable required")
            })?,
            approver_email: get("APROVADOR_EMAIL").map(|e| e.trim().to_string()),
            d4sign_timeout_secs: get("D4SIGN_TIMEOUT_SECS")
                .map(|t| t.trim().parse::<u64>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("D4SIGN_TIMEOUT_SECS must be a positive integer"))?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        if config.d4sign_timeout_secs == 0 {
            anyhow::bail!("D4SIGN_TIMEOUT_SECS must be greater than zero");
        }

        // Log successful configuration load (without sensitive values)
        tracing::debug!("D4Sign Base URL: {}", config.d4sign_base_url);
        tracing::debug!("D4Sign template: {}", config.d4sign_template_id);
        match config.approver_email {
            Some(ref approver) => tracing::info!("Approver configured: {}", approver),
            None => tracing::info!("No approver configured, contact signs alone"),
        }
        if config.d4sign_crypt_key.is_none() {
            tracing::debug!("D4SIGN_CRYPT_KEY not set, cryptKey will be omitted");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("D4SIGN_TOKEN", "live_token"),
        ("D4SIGN_COFFER_UUID", "coffer-1"),
        ("D4SIGN_TEMPLATE_ID", "MTIzNA=="),
    ];

    #[test]
    fn test_defaults_to_sandbox() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.d4sign_base_url, D4SIGN_SANDBOX_URL);
        assert_eq!(config.port, 3000);
        assert_eq!(config.d4sign_timeout_secs, 30);
        assert!(config.approver_email.is_none());
        assert!(config.d4sign_crypt_key.is_none());
    }

    #[test]
    fn test_production_environment() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("D4SIGN_ENV", "production"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.d4sign_base_url, D4SIGN_PRODUCTION_URL);
    }

    #[test]
    fn test_base_url_override_wins() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("D4SIGN_ENV", "production"));
        vars.push(("D4SIGN_BASE_URL", "http://127.0.0.1:9000/api/v1/"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.d4sign_base_url, "http://127.0.0.1:9000/api/v1");
    }

    #[test]
    fn test_unknown_environment_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("D4SIGN_ENV", "staging"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_missing_token_rejected() {
        let vars = [
            ("D4SIGN_COFFER_UUID", "coffer-1"),
            ("D4SIGN_TEMPLATE_ID", "MTIzNA=="),
        ];
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("D4SIGN_TOKEN"));
    }

    #[test]
    fn test_blank_optional_values_are_unset() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("APROVADOR_EMAIL", "   "));
        vars.push(("D4SIGN_CRYPT_KEY", ""));
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert!(config.approver_email.is_none());
        assert!(config.d4sign_crypt_key.is_none());
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "not-a-port"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("D4SIGN_TIMEOUT_SECS", "0"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }
}
