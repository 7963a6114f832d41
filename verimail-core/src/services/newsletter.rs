use std::sync::Arc;

use crate::{
    Error, IssuedLink, repositories::CodeStore, services::LinkIssuer, services::MailerService,
    validation::validate_email,
};

/// Newsletter signup: validate the address, issue a link and mail it
pub struct NewsletterService<S: CodeStore + ?Sized> {
    issuer: Arc<LinkIssuer<S>>,
    mailer: Option<Arc<dyn MailerService>>,
}

impl<S: CodeStore + ?Sized> NewsletterService<S> {
    pub fn new(issuer: Arc<LinkIssuer<S>>) -> Self {
        Self {
            issuer,
            mailer: None,
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn MailerService>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn issuer(&self) -> &Arc<LinkIssuer<S>> {
        &self.issuer
    }

    /// Start the double opt-in for `email`
    ///
    /// Without a mailer the link is only logged, which is how local
    /// development picks it up.
    pub async fn subscribe(&self, email: &str) -> Result<IssuedLink, Error> {
        let email = email.trim();
        validate_email(email)?;

        let link = self.issuer.issue_link(email).await?;

        match &self.mailer {
            Some(mailer) => mailer.send_confirmation_email(email, &link).await?,
            None => tracing::debug!(url = %link.url, "No mailer configured, confirmation link not sent"),
        }

        Ok(link)
    }
}
