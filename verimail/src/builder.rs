//! Builder for assembling a [`Verimail`] instance from configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use verimail::{VerimailBuilder, VerimailConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let verimail = VerimailBuilder::new(VerimailConfig::from_env()?)
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     let link = verimail.issue_link("driver@example.com").await?;
//!     println!("{}", link.url);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use verimail_core::{
    CodeStore, ConfirmationService, LinkIssuer, MemoryCodeStore, MemoryRecordingSink,
    NewsletterService, RecordingSink, SinkConfig, SinkError, StoreConfig, VerimailConfig,
    services::MailerService,
};

use crate::Verimail;

#[cfg(feature = "mailer")]
use verimail_core::services::VerimailMailerService;
#[cfg(feature = "mailer")]
use verimail_mailer::MailerConfig;

/// Errors that can occur when building a [`Verimail`] instance.
#[derive(Debug, thiserror::Error)]
pub enum VerimailBuilderError {
    /// Failed to connect to the code store
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// The configuration names a backend this build cannot provide
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The recording sink could not be set up
    #[error("Recording sink setup failed: {0}")]
    Sink(#[from] SinkError),

    /// Failed to configure mailer
    #[error("Mailer configuration failed: {0}")]
    MailerConfiguration(String),
}

/// Assembles the store, sink, mailer and services described by a
/// [`VerimailConfig`]
///
/// Backends given explicitly with [`with_store`](Self::with_store) or
/// [`with_sink`](Self::with_sink) take precedence over the configuration.
pub struct VerimailBuilder {
    config: VerimailConfig,
    store: Option<Arc<dyn CodeStore>>,
    sink: Option<Arc<dyn RecordingSink>>,
    mailer: Option<Arc<dyn MailerService>>,
    #[cfg(feature = "mailer")]
    mailer_config: Option<MailerConfig>,
    apply_migrations: bool,
    persistent_store: bool,
}

impl VerimailBuilder {
    pub fn new(config: VerimailConfig) -> Self {
        Self {
            config,
            store: None,
            sink: None,
            mailer: None,
            #[cfg(feature = "mailer")]
            mailer_config: None,
            apply_migrations: false,
            persistent_store: false,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn CodeStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn RecordingSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn MailerService>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Send confirmation emails through the transport described by `config`
    #[cfg(feature = "mailer")]
    pub fn with_mailer_config(mut self, config: MailerConfig) -> Self {
        self.mailer_config = Some(config);
        self
    }

    /// Run pending migrations on SQLite stores during [`build`](Self::build)
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }

    /// Refuse to build on a store that does not outlive this process
    ///
    /// One-shot commands such as issuing a link or purging need this: on an
    /// in-memory store their work is lost as soon as they exit.
    pub fn require_persistent_store(mut self, require: bool) -> Self {
        self.persistent_store = require;
        self
    }

    pub async fn build(self) -> Result<Verimail, VerimailBuilderError> {
        if self.persistent_store && self.store.is_none() && self.config.store.is_ephemeral() {
            return Err(VerimailBuilderError::InvalidConfiguration(
                "this command needs a persistent store; set VERIMAIL_STORE_URL to a sqlite file"
                    .to_string(),
            ));
        }

        let store = match self.store {
            Some(store) => store,
            None => build_store(&self.config.store, self.apply_migrations).await?,
        };

        let sink = match self.sink {
            Some(sink) => sink,
            None => build_sink(&self.config.sink)?,
        };

        #[cfg(feature = "mailer")]
        let mailer = match (self.mailer, self.mailer_config) {
            (Some(mailer), _) => Some(mailer),
            (None, Some(config)) => Some(Arc::new(
                VerimailMailerService::new(config)
                    .map_err(|e| VerimailBuilderError::MailerConfiguration(e.to_string()))?,
            ) as Arc<dyn MailerService>),
            (None, None) => None,
        };
        #[cfg(not(feature = "mailer"))]
        let mailer = self.mailer;

        let issuer = Arc::new(
            LinkIssuer::new(store.clone(), self.config.base_url.clone())
                .with_ttl(self.config.code_ttl)
                .with_timeout(self.config.store_timeout),
        );

        let mut newsletter = NewsletterService::new(issuer.clone());
        if let Some(mailer) = mailer {
            newsletter = newsletter.with_mailer(mailer);
        }

        let confirmation = ConfirmationService::new(store.clone(), sink)
            .with_store_timeout(self.config.store_timeout)
            .with_sink_timeout(self.config.sink_timeout);

        Ok(Verimail {
            store,
            issuer,
            newsletter: Arc::new(newsletter),
            confirmation: Arc::new(confirmation),
            store_timeout: self.config.store_timeout,
        })
    }
}

async fn build_store(
    config: &StoreConfig,
    apply_migrations: bool,
) -> Result<Arc<dyn CodeStore>, VerimailBuilderError> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryCodeStore::new())),
        #[cfg(feature = "sqlite")]
        StoreConfig::Sqlite { url } => {
            let store = verimail_storage_sqlite::SqliteCodeStore::connect(url)
                .await
                .map_err(|e| VerimailBuilderError::StorageConnection(e.to_string()))?;

            if apply_migrations {
                store
                    .migrate()
                    .await
                    .map_err(|e| VerimailBuilderError::Migration(e.to_string()))?;
            }
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        StoreConfig::Sqlite { .. } => {
            let _ = apply_migrations;
            Err(VerimailBuilderError::InvalidConfiguration(
                "SQLite store requested but the `sqlite` feature is disabled".to_string(),
            ))
        }
    }
}

fn build_sink(config: &SinkConfig) -> Result<Arc<dyn RecordingSink>, VerimailBuilderError> {
    match config {
        SinkConfig::Memory => {
            tracing::warn!("No spreadsheet configured, confirmed emails are kept in memory");
            Ok(Arc::new(MemoryRecordingSink::new()))
        }
        #[cfg(feature = "sheets")]
        SinkConfig::GoogleSheets {
            credentials_json,
            sheet_id,
            range,
        } => {
            let credentials =
                verimail_sheets::ServiceAccountCredentials::from_json(credentials_json)?;
            let sink = verimail_sheets::SheetsRecordingSink::new(credentials, sheet_id, range)?;
            Ok(Arc::new(sink))
        }
        #[cfg(not(feature = "sheets"))]
        SinkConfig::GoogleSheets { .. } => Err(VerimailBuilderError::InvalidConfiguration(
            "Google Sheets sink requested but the `sheets` feature is disabled".to_string(),
        )),
    }
}
