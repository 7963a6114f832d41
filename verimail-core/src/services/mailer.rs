use async_trait::async_trait;

use crate::{Error, IssuedLink};

/// Delivers confirmation links to subscribers
#[async_trait]
pub trait MailerService: Send + Sync {
    async fn send_confirmation_email(&self, to: &str, link: &IssuedLink) -> Result<(), Error>;
}

#[cfg(feature = "mailer")]
pub use self::mailer_impl::*;

#[cfg(feature = "mailer")]
mod mailer_impl {
    use super::MailerService;
    use crate::{Error, IssuedLink};
    use async_trait::async_trait;
    use chrono::Utc;
    use verimail_mailer::prelude::*;

    /// Renders the confirmation email and hands it to a [`Mailer`]
    pub struct VerimailMailerService {
        outbox: Box<dyn Mailer>,
        config: MailerConfig,
    }

    impl VerimailMailerService {
        pub fn new(config: MailerConfig) -> Result<Self, Error> {
            let outbox = Outbox::open(&config.transport).map_err(mail_error)?;
            tracing::info!(kind = outbox.kind(), "Confirmation emails enabled");
            Ok(Self::with_outbox(config, Box::new(outbox)))
        }

        pub fn with_outbox(config: MailerConfig, outbox: Box<dyn Mailer>) -> Self {
            Self { outbox, config }
        }

        pub fn from_env() -> Result<Self, Error> {
            Self::new(MailerConfig::from_env())
        }
    }

    fn mail_error(e: MailerError) -> Error {
        Error::Mail(e.to_string())
    }

    /// Whole minutes until `link` expires, rounded up
    fn minutes_left(link: &IssuedLink) -> i64 {
        let seconds = (link.expires_at - Utc::now()).num_seconds().max(0);
        (seconds + 59) / 60
    }

    #[async_trait]
    impl MailerService for VerimailMailerService {
        async fn send_confirmation_email(
            &self,
            to: &str,
            link: &IssuedLink,
        ) -> Result<(), Error> {
            let message =
                ConfirmationMessage::compose(&self.config, to, &link.url, minutes_left(link))
                    .map_err(mail_error)?;
            self.outbox.deliver(message).await.map_err(mail_error)?;

            tracing::info!(to, "Sent confirmation email");
            Ok(())
        }
    }

}
