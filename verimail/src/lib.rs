//! # Verimail
//!
//! Double opt-in confirmation for newsletter signups. A signup issues a
//! one-time code that lives for an hour; the emailed link redeems it exactly
//! once, and the confirmed address is appended to a spreadsheet.
//!
//! Crates in this workspace:
//!
//! - `verimail-core`: codes, the [`CodeStore`] and [`RecordingSink`] seams, services
//! - `verimail-storage-sqlite`: SQLite code store (feature `sqlite`)
//! - `verimail-sheets`: Google Sheets sink (feature `sheets`)
//! - `verimail-mailer`: confirmation emails (feature `mailer`)
//! - `verimail-axum`: the HTTP routes
//!
//! ```rust,no_run
//! use verimail::{VerimailBuilder, VerimailConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let verimail = VerimailBuilder::new(VerimailConfig::new("https://cdlhelp.com"))
//!         .build()
//!         .await?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, verimail.router()).await?;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod client;

use std::sync::Arc;
use std::time::Duration;

pub use builder::{VerimailBuilder, VerimailBuilderError};
pub use client::{ConfirmationStatus, ConfirmationView};
pub use verimail_axum::{AppState, DynConfirmationService, DynNewsletterService};
pub use verimail_core::{
    CodeStore, ConfigError, ConfirmedEmail, Error, IssuedLink, MemoryCodeStore,
    MemoryRecordingSink, RecordingSink, SinkConfig, SinkError, StoreConfig, VerimailConfig,
};

#[cfg(feature = "mailer")]
pub use verimail_mailer::{MailerConfig, TransportConfig};

#[cfg(feature = "sqlite")]
pub use verimail_storage_sqlite::SqliteCodeStore;

#[cfg(feature = "sheets")]
pub use verimail_sheets::{ServiceAccountCredentials, SheetsRecordingSink};

use verimail_core::{LinkIssuer, validation::validate_email};

/// A fully wired confirmation service
pub struct Verimail {
    store: Arc<dyn CodeStore>,
    issuer: Arc<LinkIssuer<dyn CodeStore>>,
    newsletter: Arc<DynNewsletterService>,
    confirmation: Arc<DynConfirmationService>,
    store_timeout: Duration,
}

impl Verimail {
    pub fn store(&self) -> &Arc<dyn CodeStore> {
        &self.store
    }

    pub fn issuer(&self) -> &Arc<LinkIssuer<dyn CodeStore>> {
        &self.issuer
    }

    pub fn newsletter(&self) -> &Arc<DynNewsletterService> {
        &self.newsletter
    }

    pub fn confirmation(&self) -> &Arc<DynConfirmationService> {
        &self.confirmation
    }

    /// Issue a confirmation link for `email` without mailing it
    pub async fn issue_link(&self, email: &str) -> Result<IssuedLink, Error> {
        let email = email.trim();
        validate_email(email)?;
        self.issuer.issue_link(email).await
    }

    /// Sign `email` up: issue a link and mail it if a mailer is configured
    pub async fn subscribe(&self, email: &str) -> Result<IssuedLink, Error> {
        self.newsletter.subscribe(email).await
    }

    /// Redeem a confirmation code; see [`verimail_core::ConfirmationService::confirm`]
    pub async fn confirm(&self, code: Option<&str>) -> Result<ConfirmedEmail, Error> {
        self.confirmation.confirm(code).await
    }

    /// Remove expired codes from the store
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        tokio::time::timeout(self.store_timeout, self.store.purge_expired())
            .await
            .map_err(|_| Error::Timeout("code store"))?
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        self.confirmation.health_check().await
    }

    /// The HTTP routes bound to this instance
    pub fn router(&self) -> axum::Router {
        verimail_axum::routes(AppState::new(
            self.newsletter.clone(),
            self.confirmation.clone(),
        ))
    }
}
