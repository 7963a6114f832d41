//! Core functionality for verimail
//!
//! Verimail runs the double opt-in flow of a newsletter signup: a one-time
//! code is issued for an email address, stored with a time-to-live, mailed as
//! a confirmation link, and redeemed exactly once, at which point the address
//! is appended to a [`RecordingSink`].
//!
//! The storage seam is [`CodeStore`]; [`MemoryCodeStore`] is provided here and
//! other backends live in their own crates. Business logic lives in
//! [`services`].
pub mod code;
pub mod config;
pub mod error;
pub mod repositories;
pub mod services;
pub mod sink;
pub mod validation;

pub use code::{ConfirmedEmail, IssuedLink, VerificationCode, generate_code};
pub use config::{ConfigError, SinkConfig, StoreConfig, VerimailConfig};
pub use error::{Error, SinkError, StorageError, ValidationError};
pub use repositories::{CodeStore, MemoryCodeStore};
pub use services::{ConfirmationService, LinkIssuer, NewsletterService};
pub use sink::{MemoryRecordingSink, RecordingSink};
