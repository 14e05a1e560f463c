//! Credentials and endpoint configuration.

/// Default Labellerr API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.labellerr.com";

/// Origin the API accepts requests from.
pub const ALLOWED_ORIGIN: &str = "https://pro.labellerr.com";

/// Value of the `source` header sent with every request.
pub const REQUEST_SOURCE: &str = "mcp-sdk";

/// Environment variable names for the three required credentials.
pub const API_KEY_ENV: &str = "LABELLERR_API_KEY";
/// See [`API_KEY_ENV`].
pub const API_SECRET_ENV: &str = "LABELLERR_API_SECRET";
/// See [`API_KEY_ENV`].
pub const CLIENT_ID_ENV: &str = "LABELLERR_CLIENT_ID";

/// Environment variable overriding [`DEFAULT_BASE_URL`].
pub const BASE_URL_ENV: &str = "LABELLERR_BASE_URL";

/// Static credentials forwarded on every API call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// API key
    pub api_key: String,
    /// API secret
    pub api_secret: String,
    /// Client id, also used in most query strings
    pub client_id: String,
}

impl Credentials {
    /// Build credentials only if all three values are present and non-empty.
    pub fn from_parts(
        api_key: Option<String>,
        api_secret: Option<String>,
        client_id: Option<String>,
    ) -> Option<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Some(Self {
            api_key: non_empty(api_key)?,
            api_secret: non_empty(api_secret)?,
            client_id: non_empty(client_id)?,
        })
    }

    /// Read credentials from the process environment.
    pub fn from_env() -> Option<Self> {
        Self::from_parts(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(API_SECRET_ENV).ok(),
            std::env::var(CLIENT_ID_ENV).ok(),
        )
    }

    /// Headers injected into every request.
    pub fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("api_key".to_string(), self.api_key.clone()),
            ("api_secret".to_string(), self.api_secret.clone()),
            ("client_id".to_string(), self.client_id.clone()),
            ("source".to_string(), REQUEST_SOURCE.to_string()),
            ("origin".to_string(), ALLOWED_ORIGIN.to_string()),
        ]
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::from_parts(
            Some("key-123".into()),
            Some("secret-456".into()),
            Some("client-789".into()),
        )
        .unwrap();
        let printed = format!("{creds:?}");
        assert!(!printed.contains("key-123"));
        assert!(!printed.contains("secret-456"));
        assert!(printed.contains("client-789"));
    }

    #[test]
    fn test_from_parts_requires_all_three() {
        assert!(Credentials::from_parts(Some("k".into()), Some("s".into()), None).is_none());
        assert!(Credentials::from_parts(Some("k".into()), Some("".into()), Some("c".into())).is_none());

        let creds = Credentials::from_parts(Some("k".into()), Some("s".into()), Some("c".into()))
            .expect("all parts present");
        assert_eq!(creds.client_id, "c");
    }

    #[test]
    fn test_headers_include_source_and_origin() {
        let creds = Credentials::from_parts(Some("k".into()), Some("s".into()), Some("c".into()))
            .unwrap();
        let headers = creds.headers();
        assert!(headers.contains(&("api_key".to_string(), "k".to_string())));
        assert!(headers.contains(&("source".to_string(), "mcp-sdk".to_string())));
        assert!(headers.contains(&("origin".to_string(), ALLOWED_ORIGIN.to_string())));
    }
}
