use serde::Deserialize;
use std::fmt;
use verimail_core::SinkError;

/// Google's OAuth token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The fields of a service-account key file the sink needs
#[derive(Clone, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    /// PEM-encoded RSA private key
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountCredentials {
    /// Parse the contents of a key file as downloaded from the Cloud console
    pub fn from_json(json: &str) -> Result<Self, SinkError> {
        let credentials: Self = serde_json::from_str(json)
            .map_err(|e| SinkError::Credentials(format!("Malformed service account key: {e}")))?;

        if credentials.client_email.is_empty() {
            return Err(SinkError::Credentials("client_email is empty".to_string()));
        }

        // Keys pasted into env files often carry literal `\n` sequences.
        let credentials = Self {
            private_key: credentials.private_key.replace("\\n", "\n"),
            ..credentials
        };
        Ok(credentials)
    }
}

impl fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
