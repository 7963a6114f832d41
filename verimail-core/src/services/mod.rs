//! Service layer for business logic
//!
//! [`LinkIssuer`] creates codes, [`ConfirmationService`] redeems them and
//! [`NewsletterService`] ties signup validation, issuance and mail delivery
//! together. Every call into a code store or recording sink is bounded by a
//! timeout.

pub mod confirmation;
pub mod link_issuer;
pub mod mailer;
pub mod newsletter;

pub use confirmation::ConfirmationService;
pub use link_issuer::LinkIssuer;
pub use mailer::MailerService;
pub use newsletter::NewsletterService;

#[cfg(feature = "mailer")]
pub use mailer::VerimailMailerService;

use std::future::Future;
use std::time::Duration;

use crate::Error;

/// Default bound on a single code store operation
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on a single recording sink append
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a code store operation, turning an elapsed deadline into [`Error::Timeout`]
pub(crate) async fn store_call<T, F>(limit: Duration, operation: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| Error::Timeout("code store"))?
}
