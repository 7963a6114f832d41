//! Google Sheets [`RecordingSink`](verimail_core::RecordingSink)
//!
//! Each confirmed address becomes a new row appended after the configured
//! range. Requests are authorized with a service-account key: a signed JWT
//! is exchanged for an access token, which is cached until shortly before
//! it expires.
//!
//! ```rust,no_run
//! use verimail_sheets::{ServiceAccountCredentials, SheetsRecordingSink};
//!
//! # fn run(json: &str) -> Result<(), verimail_core::SinkError> {
//! let credentials = ServiceAccountCredentials::from_json(json)?;
//! let sink = SheetsRecordingSink::new(credentials, "sheet-id", "Sheet1!A1")?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod credentials;
mod sink;

pub use auth::SPREADSHEETS_SCOPE;
pub use credentials::ServiceAccountCredentials;
pub use sink::{DEFAULT_API_BASE, SheetsRecordingSink};

#[cfg(test)]
pub(crate) mod test_keys;
