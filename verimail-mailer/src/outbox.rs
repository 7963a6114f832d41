use crate::{ConfirmationMessage, Mailer, MailerError, SmtpSecurity, TransportConfig};
use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{
    AsyncFileTransport, AsyncSendmailTransport, AsyncSmtpTransport, AsyncTransport,
    Tokio1Executor,
};
use std::path::PathBuf;

/// The delivery channel chosen by a [`TransportConfig`]
pub enum Outbox {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    /// One `.eml` file per message, for local development
    Directory {
        transport: AsyncFileTransport<Tokio1Executor>,
        path: PathBuf,
    },
    Sendmail(AsyncSendmailTransport<Tokio1Executor>),
}

impl Outbox {
    /// Open the outbox described by `config`, creating the output
    /// directory for file delivery.
    pub fn open(config: &TransportConfig) -> Result<Self, MailerError> {
        match config {
            TransportConfig::Smtp {
                host,
                port,
                username,
                password,
                security,
            } => {
                let mut relay = match security {
                    SmtpSecurity::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(host)?,
                    SmtpSecurity::StartTls => {
                        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
                    }
                    SmtpSecurity::Plain => {
                        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                    }
                };
                if let Some(port) = port {
                    relay = relay.port(*port);
                }
                if let (Some(username), Some(password)) = (username, password) {
                    relay = relay.credentials(Credentials::new(username.clone(), password.clone()));
                }

                tracing::debug!(%host, ?security, "Using SMTP outbox");
                Ok(Self::Smtp(relay.build()))
            }
            TransportConfig::File { output_dir } => {
                std::fs::create_dir_all(output_dir)?;
                Ok(Self::Directory {
                    transport: AsyncFileTransport::new(output_dir),
                    path: output_dir.clone(),
                })
            }
            TransportConfig::Sendmail { command } => Ok(Self::Sendmail(match command {
                Some(command) => AsyncSendmailTransport::new_with_command(command),
                None => AsyncSendmailTransport::new(),
            })),
        }
    }

    /// Short name of the channel, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Outbox::Smtp(_) => "smtp",
            Outbox::Directory { .. } => "file",
            Outbox::Sendmail(_) => "sendmail",
        }
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn deliver(&self, message: ConfirmationMessage) -> Result<(), MailerError> {
        let mime = message.to_mime()?;

        match self {
            Outbox::Smtp(transport) => {
                transport.send(mime).await?;
            }
            Outbox::Directory { transport, path } => {
                let id = transport.send(mime).await?;
                tracing::debug!(dir = %path.display(), %id, "Wrote confirmation email");
            }
            Outbox::Sendmail(transport) => transport.send(mime).await?,
        }
        Ok(())
    }
}
