use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::{
    Error, IssuedLink,
    code::{DEFAULT_CODE_TTL, MAX_CODE_TTL, generate_code},
    repositories::CodeStore,
    services::{DEFAULT_STORE_TIMEOUT, store_call},
};

/// Path of the confirmation page that redeems a code
pub const CONFIRM_PATH: &str = "/confirm";

/// Issues one-time confirmation links
pub struct LinkIssuer<S: CodeStore + ?Sized> {
    store: Arc<S>,
    base_url: String,
    ttl: Duration,
    timeout: StdDuration,
}

impl<S: CodeStore + ?Sized> LinkIssuer<S> {
    /// Create an issuer writing to `store` and building links under `base_url`
    pub fn new(store: Arc<S>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            store,
            base_url,
            ttl: DEFAULT_CODE_TTL,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Set the code lifetime, capped at [`MAX_CODE_TTL`]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        if ttl > MAX_CODE_TTL {
            tracing::warn!(ttl_secs = ttl.num_seconds(), "Code TTL capped at 30 days");
        }
        self.ttl = ttl.min(MAX_CODE_TTL);
        self
    }

    pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn confirmation_url(&self, code: &str) -> String {
        format!("{}{}?code={}", self.base_url, CONFIRM_PATH, code)
    }

    /// Generate a code for `email`, store it for the configured TTL and
    /// return the link that redeems it
    ///
    /// The email is stored as given; validation is the caller's concern.
    /// A store failure or timeout is returned unchanged.
    pub async fn issue_link(&self, email: &str) -> Result<IssuedLink, Error> {
        let code = generate_code();

        let entry = store_call(self.timeout, self.store.put(&code, email, self.ttl)).await?;

        tracing::info!(email, expires_at = %entry.expires_at, "Issued confirmation link");

        Ok(IssuedLink {
            url: self.confirmation_url(&code),
            code,
            expires_at: entry.expires_at,
        })
    }
}
