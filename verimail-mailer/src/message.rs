use crate::{MailerConfig, MailerError, template::ConfirmationTemplate};
use lettre::Message;
use lettre::message::{Mailbox, MultiPart};

/// A rendered confirmation email for one subscriber
#[derive(Debug, Clone)]
pub struct ConfirmationMessage {
    pub sender: Mailbox,
    pub recipient: Mailbox,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl ConfirmationMessage {
    /// Render the email asking `to` to open `confirm_link`
    pub fn compose(
        config: &MailerConfig,
        to: &str,
        confirm_link: &str,
        expires_in_minutes: i64,
    ) -> Result<Self, MailerError> {
        let (html, text) = ConfirmationTemplate {
            branding: &config.branding,
            confirm_link,
            expires_in_minutes,
        }
        .render_parts()?;

        Ok(Self {
            sender: mailbox(&config.sender())?,
            recipient: mailbox(to)?,
            subject: format!("{} | Confirm your email", config.branding.app_name),
            html,
            text,
        })
    }

    /// The MIME message handed to lettre: text and HTML as alternatives
    pub fn to_mime(&self) -> Result<Message, MailerError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(self.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                self.text.clone(),
                self.html.clone(),
            ))?;
        Ok(message)
    }
}

fn mailbox(raw: &str) -> Result<Mailbox, MailerError> {
    raw.parse()
        .map_err(|_| MailerError::Mailbox(raw.to_string()))
}
