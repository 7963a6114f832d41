//! Durable record of confirmed addresses

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use crate::SinkError;

/// Append-only destination for confirmed email addresses
///
/// Appends are not idempotent; recording the same address twice yields two
/// rows.
#[async_trait]
pub trait RecordingSink: Send + Sync + 'static {
    async fn record(&self, email: &str) -> Result<(), SinkError>;
}

/// Keeps recorded addresses in memory
///
/// Used when no spreadsheet is configured and in tests; `set_failing(true)`
/// makes every subsequent `record` fail.
#[derive(Debug, Default)]
pub struct MemoryRecordingSink {
    rows: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemoryRecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of the recorded rows, oldest first
    pub fn rows(&self) -> Vec<String> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RecordingSink for MemoryRecordingSink {
    async fn record(&self, email: &str) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable(
                "memory sink is set to fail".to_string(),
            ));
        }

        self.rows
            .lock()
            .map_err(|_| SinkError::Unavailable("memory sink lock poisoned".to_string()))?
            .push(email.to_string());
        Ok(())
    }
}
