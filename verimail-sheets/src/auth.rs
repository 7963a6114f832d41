use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use verimail_core::SinkError;

use crate::ServiceAccountCredentials;

/// OAuth scope granting read/write access to spreadsheets
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS as u64
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Exchanges signed service-account assertions for access tokens
pub(crate) struct ServiceAccountAuth {
    client_email: String,
    token_uri: String,
    key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(credentials: &ServiceAccountCredentials) -> Result<Self, SinkError> {
        let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| SinkError::Credentials(format!("Invalid private key: {e}")))?;

        Ok(Self {
            client_email: credentials.client_email.clone(),
            token_uri: credentials.token_uri.clone(),
            key,
            cached: Mutex::new(None),
        })
    }

    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    fn assertion(&self) -> Result<String, SinkError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: SPREADSHEETS_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| SinkError::Auth(format!("Failed to sign assertion: {e}")))
    }

    /// A valid access token, fetching a new one when the cached token is
    /// missing or about to expire
    pub async fn access_token(&self, http: &reqwest::Client) -> Result<String, SinkError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
        }

        let response = http
            .post(&self.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", self.assertion()?.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SinkError::Transport(format!("Token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body, "Token exchange rejected");
            return Err(SinkError::Auth(format!("Token endpoint returned {status}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SinkError::Auth(format!("Malformed token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in);
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN),
        });

        tracing::debug!(expires_in = token.expires_in, "Fetched spreadsheet access token");
        Ok(token.access_token)
    }

    /// Drop the cached token so the next call fetches a fresh one
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_keys::{PRIVATE_KEY, PUBLIC_KEY};
    use jsonwebtoken::{DecodingKey, Validation, decode};

    fn credentials() -> ServiceAccountCredentials {
        ServiceAccountCredentials {
            client_email: "sheets@cdl-help.iam.gserviceaccount.com".to_string(),
            private_key: String::from_utf8(PRIVATE_KEY.to_vec()).unwrap(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        }
    }

    #[test]
    fn test_assertion_claims() {
        let auth = ServiceAccountAuth::new(&credentials()).unwrap();
        let jwt = auth.assertion().unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth2.googleapis.com/token"]);
        let decoded = decode::<AssertionClaims>(
            &jwt,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.claims.iss, "sheets@cdl-help.iam.gserviceaccount.com");
        assert_eq!(decoded.claims.scope, SPREADSHEETS_SCOPE);
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
    }

    #[test]
    fn test_invalid_private_key() {
        let credentials = ServiceAccountCredentials {
            private_key: "not a key".to_string(),
            ..credentials()
        };
        assert!(matches!(
            ServiceAccountAuth::new(&credentials),
            Err(SinkError::Credentials(_))
        ));
    }
}
