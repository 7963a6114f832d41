use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::{
    ConfirmedEmail, Error, SinkError,
    repositories::CodeStore,
    services::{DEFAULT_SINK_TIMEOUT, DEFAULT_STORE_TIMEOUT, store_call},
    sink::RecordingSink,
    validation::validate_code,
};

/// Redeems confirmation codes and records the confirmed address
///
/// A redemption is: validate the code, atomically take it from the store,
/// then append the email to the sink. The code is gone once taken; if the
/// append fails it is not restored, and the subscriber has to sign up again.
pub struct ConfirmationService<S: CodeStore + ?Sized, R: RecordingSink + ?Sized> {
    store: Arc<S>,
    sink: Arc<R>,
    store_timeout: Duration,
    sink_timeout: Duration,
}

impl<S: CodeStore + ?Sized, R: RecordingSink + ?Sized> ConfirmationService<S, R> {
    pub fn new(store: Arc<S>, sink: Arc<R>) -> Self {
        Self {
            store,
            sink,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            sink_timeout: DEFAULT_SINK_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_sink_timeout(mut self, timeout: Duration) -> Self {
        self.sink_timeout = timeout;
        self
    }

    /// Redeem `code`
    ///
    /// # Errors
    ///
    /// * [`Error::Validation`] if the code is missing or blank; the store is
    ///   not consulted
    /// * [`Error::NotFound`] if the code is unknown, expired or already used
    /// * [`Error::Storage`] / [`Error::Timeout`] if the store failed
    /// * [`Error::Recording`] if the sink failed or timed out; the code has
    ///   been consumed regardless
    pub async fn confirm(&self, code: Option<&str>) -> Result<ConfirmedEmail, Error> {
        let code = validate_code(code)?;

        let email = match store_call(self.store_timeout, self.store.take(code)).await? {
            Some(email) => email,
            None => {
                tracing::warn!("Confirmation attempted with an unknown or expired code");
                return Err(Error::NotFound);
            }
        };

        match tokio::time::timeout(self.sink_timeout, self.sink.record(&email)).await {
            Ok(Ok(())) => {
                tracing::info!(email = %email, "Email confirmed and recorded");
                Ok(ConfirmedEmail {
                    email,
                    confirmed_at: Utc::now(),
                })
            }
            Ok(Err(e)) => {
                tracing::error!(email = %email, error = %e, "Failed to record confirmed email");
                Err(Error::Recording(e))
            }
            Err(_) => {
                tracing::error!(email = %email, "Recording sink timed out");
                Err(Error::Recording(SinkError::Timeout))
            }
        }
    }

    /// Check that the underlying code store is reachable
    pub async fn health_check(&self) -> Result<(), Error> {
        store_call(self.store_timeout, self.store.health_check()).await
    }
}
