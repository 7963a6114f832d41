//! Explicit service configuration
//!
//! Everything the flow needs from its environment is enumerated here and
//! passed in at construction time. [`VerimailConfig::from_env`] is a
//! convenience for the server binary.

use std::fmt;
use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

use crate::code::{DEFAULT_CODE_TTL, MAX_CODE_TTL};
use crate::services::{DEFAULT_SINK_TIMEOUT, DEFAULT_STORE_TIMEOUT};

/// Default sheet range new rows are appended after
pub const DEFAULT_SHEET_RANGE: &str = "Sheet1!A1";

/// Errors when loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("missing env var {0}")]
    MissingEnv(&'static str),

    /// A value was present but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where verification codes live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Sqlite { url: String },
}

impl StoreConfig {
    /// Whether codes vanish with the process that holds them
    pub fn is_ephemeral(&self) -> bool {
        match self {
            StoreConfig::Memory => true,
            StoreConfig::Sqlite { url } => url.contains(":memory:") || url.contains("mode=memory"),
        }
    }
}

/// Where confirmed addresses are recorded
#[derive(Clone, PartialEq, Eq)]
pub enum SinkConfig {
    Memory,
    GoogleSheets {
        /// Service-account key file contents (JSON)
        credentials_json: String,
        sheet_id: String,
        range: String,
    },
}

impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkConfig::Memory => f.write_str("Memory"),
            SinkConfig::GoogleSheets {
                sheet_id, range, ..
            } => f
                .debug_struct("GoogleSheets")
                .field("credentials_json", &"<redacted>")
                .field("sheet_id", sheet_id)
                .field("range", range)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerimailConfig {
    /// Origin confirmation links are built under, e.g. `https://cdlhelp.com`
    pub base_url: String,
    pub store: StoreConfig,
    pub sink: SinkConfig,
    /// Lifetime of an issued code (default: 1 hour)
    pub code_ttl: Duration,
    /// Bound on a single code store call (default: 5 seconds)
    pub store_timeout: StdDuration,
    /// Bound on a single sink append (default: 10 seconds)
    pub sink_timeout: StdDuration,
}

impl VerimailConfig {
    /// In-memory store and sink with default timings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            store: StoreConfig::Memory,
            sink: SinkConfig::Memory,
            code_ttl: DEFAULT_CODE_TTL,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            sink_timeout: DEFAULT_SINK_TIMEOUT,
        }
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn with_sink(mut self, sink: SinkConfig) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = ttl;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup; see [`VerimailConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingEnv("BASE_URL"))?;

        let store = match lookup("VERIMAIL_STORE_URL").as_deref() {
            None | Some("memory") => StoreConfig::Memory,
            Some(url) if url.starts_with("sqlite:") => StoreConfig::Sqlite {
                url: url.to_string(),
            },
            Some(other) => {
                return Err(ConfigError::Invalid(format!(
                    "VERIMAIL_STORE_URL must be `memory` or a sqlite: URL, got `{other}`"
                )));
            }
        };

        let sink = match lookup("GOOGLE_SERVICE_ACCOUNT_CREDENTIALS") {
            Some(credentials_json) => SinkConfig::GoogleSheets {
                credentials_json,
                sheet_id: lookup("SHEET_ID").ok_or(ConfigError::MissingEnv("SHEET_ID"))?,
                range: lookup("SHEET_RANGE").unwrap_or_else(|| DEFAULT_SHEET_RANGE.to_string()),
            },
            None => SinkConfig::Memory,
        };

        let code_ttl = match parse_u64(&lookup, "VERIMAIL_CODE_TTL_SECS")? {
            Some(secs) => i64::try_from(secs)
                .ok()
                .and_then(Duration::try_seconds)
                .filter(|ttl| *ttl > Duration::zero() && *ttl <= MAX_CODE_TTL)
                .ok_or_else(|| {
                    ConfigError::Invalid("VERIMAIL_CODE_TTL_SECS is out of range".to_string())
                })?,
            None => DEFAULT_CODE_TTL,
        };

        let store_timeout = parse_u64(&lookup, "VERIMAIL_STORE_TIMEOUT_MS")?
            .map(StdDuration::from_millis)
            .unwrap_or(DEFAULT_STORE_TIMEOUT);

        let sink_timeout = parse_u64(&lookup, "VERIMAIL_SINK_TIMEOUT_MS")?
            .map(StdDuration::from_millis)
            .unwrap_or(DEFAULT_SINK_TIMEOUT);

        Ok(Self {
            base_url,
            store,
            sink,
            code_ttl,
            store_timeout,
            sink_timeout,
        })
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid(format!("{key} must be a whole number")))
        })
        .transpose()
}
