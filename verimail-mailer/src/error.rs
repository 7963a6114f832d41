use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("not a usable mailbox: `{0}`")]
    Mailbox(String),

    #[error("confirmation email failed to render: {0}")]
    Render(#[from] askama::Error),

    #[error("confirmation email could not be assembled: {0}")]
    Compose(#[from] lettre::error::Error),

    #[error("SMTP relay refused delivery: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("could not write to the outbox directory: {0}")]
    Outbox(#[from] lettre::transport::file::Error),

    #[error("sendmail exited with an error: {0}")]
    Sendmail(#[from] lettre::transport::sendmail::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
