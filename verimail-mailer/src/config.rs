use crate::template::Branding;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_OUTBOX: &str = "./emails";

/// Where confirmation emails go and how they are signed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub transport: TransportConfig,
    pub sender_address: String,
    pub sender_name: Option<String>,
    #[serde(flatten)]
    pub branding: Branding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    Smtp {
        host: String,
        port: Option<u16>,
        username: Option<String>,
        password: Option<String>,
        #[serde(default)]
        security: SmtpSecurity,
    },
    File {
        output_dir: PathBuf,
    },
    Sendmail {
        command: Option<String>,
    },
}

/// How the SMTP connection is secured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmtpSecurity {
    /// Unencrypted; local relays only
    Plain,
    #[default]
    StartTls,
    /// TLS from the first byte, usually port 465
    Implicit,
}

impl FromStr for SmtpSecurity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "plain" => Ok(Self::Plain),
            "starttls" => Ok(Self::StartTls),
            "tls" | "implicit" => Ok(Self::Implicit),
            other => Err(format!("unknown SMTP security mode `{other}`")),
        }
    }
}

impl MailerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read `MAILER_*` variables through `lookup`.
    ///
    /// The transport is SMTP when `MAILER_SMTP_HOST` is set, sendmail when
    /// `MAILER_SENDMAIL` is, and otherwise a directory of `.eml` files
    /// (`MAILER_FILE_OUTPUT_DIR`, default `./emails`).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let branding = Branding {
            app_name: lookup("MAILER_APP_NAME").unwrap_or(defaults.branding.app_name),
            app_url: lookup("MAILER_APP_URL").unwrap_or(defaults.branding.app_url),
            logo_url: lookup("MAILER_LOGO_URL"),
        };

        Self {
            transport: transport_from(&lookup),
            sender_address: lookup("MAILER_FROM_ADDRESS").unwrap_or(defaults.sender_address),
            sender_name: lookup("MAILER_FROM_NAME"),
            branding,
        }
    }

    /// The `From` mailbox, `Name <address>` when a name is set
    pub fn sender(&self) -> String {
        match &self.sender_name {
            Some(name) => format!("{name} <{}>", self.sender_address),
            None => self.sender_address.clone(),
        }
    }
}

fn transport_from<F>(lookup: &F) -> TransportConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("MAILER_SMTP_HOST") {
        let security = lookup("MAILER_SMTP_TLS")
            .and_then(|mode| match mode.parse() {
                Ok(security) => Some(security),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring MAILER_SMTP_TLS");
                    None
                }
            })
            .unwrap_or_default();

        return TransportConfig::Smtp {
            host,
            port: lookup("MAILER_SMTP_PORT").and_then(|p| p.parse().ok()),
            username: lookup("MAILER_SMTP_USERNAME"),
            password: lookup("MAILER_SMTP_PASSWORD"),
            security,
        };
    }

    if lookup("MAILER_SENDMAIL").is_some() {
        return TransportConfig::Sendmail {
            command: lookup("MAILER_SENDMAIL_COMMAND"),
        };
    }

    TransportConfig::File {
        output_dir: lookup("MAILER_FILE_OUTPUT_DIR")
            .unwrap_or_else(|| DEFAULT_OUTBOX.to_string())
            .into(),
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::File {
                output_dir: PathBuf::from(DEFAULT_OUTBOX),
            },
            sender_address: "noreply@cdlhelp.com".to_string(),
            sender_name: None,
            branding: Branding::default(),
        }
    }
}
