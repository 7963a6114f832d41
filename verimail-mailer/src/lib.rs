//! Confirmation emails for verimail.
//!
//! A [`ConfirmationMessage`] is rendered from the signup's link and the
//! configured [`Branding`], then handed to an [`Outbox`]: an SMTP relay, a
//! directory of `.eml` files, or the local sendmail binary.

pub mod config;
pub mod error;
pub mod message;
pub mod outbox;
pub mod template;

use async_trait::async_trait;

pub use config::{MailerConfig, SmtpSecurity, TransportConfig};
pub use error::MailerError;
pub use message::ConfirmationMessage;
pub use outbox::Outbox;
pub use template::{Branding, ConfirmationTemplate};

/// Anything that can deliver a rendered confirmation email
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, message: ConfirmationMessage) -> Result<(), MailerError>;
}

pub mod prelude {
    pub use crate::{
        Branding, ConfirmationMessage, Mailer, MailerConfig, MailerError, Outbox, TransportConfig,
    };
}
