use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::{Error, VerificationCode, repositories::CodeStore};

/// Source of "now" for a [`MemoryCodeStore`]
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-process code store backed by a [`DashMap`]
///
/// `take` uses `DashMap::remove_if`, which holds the shard lock across the
/// expiry check and the removal, so a code can be redeemed only once.
/// Expired entries are dropped lazily on `take` and in bulk by
/// `purge_expired`.
pub struct MemoryCodeStore {
    entries: DashMap<String, VerificationCode>,
    clock: Clock,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Create a store that reads time from `clock` instead of the system
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

impl Default for MemoryCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn put(
        &self,
        code: &str,
        email: &str,
        ttl: Duration,
    ) -> Result<VerificationCode, Error> {
        let entry =
            VerificationCode::new(code.to_string(), email.to_string(), self.now(), ttl);
        self.entries.insert(code.to_string(), entry.clone());
        Ok(entry)
    }

    async fn take(&self, code: &str) -> Result<Option<String>, Error> {
        let now = self.now();

        if let Some((_, entry)) = self
            .entries
            .remove_if(code, |_, entry| !entry.is_expired_at(now))
        {
            return Ok(Some(entry.email));
        }

        // Either absent or expired; drop the expired entry while we are here
        self.entries
            .remove_if(code, |_, entry| entry.is_expired_at(now));
        Ok(None)
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let now = self.now();
        let mut removed = 0u64;

        self.entries.retain(|_, entry| {
            let expired = entry.is_expired_at(now);
            if expired {
                removed += 1;
            }
            !expired
        });

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// A clock that only moves when told to
    fn manual_clock() -> (Clock, Arc<AtomicI64>) {
        let millis = Arc::new(AtomicI64::new(Utc::now().timestamp_millis()));
        let handle = millis.clone();
        let clock: Clock = Arc::new(move || {
            DateTime::from_timestamp_millis(handle.load(Ordering::SeqCst)).unwrap_or_default()
        });
        (clock, millis)
    }

    fn advance(millis: &AtomicI64, by: Duration) {
        millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    #[tokio::test]
    async fn test_put_then_take_once() {
        let store = MemoryCodeStore::new();
        store
            .put("code-1", "a@b.com", Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(
            store.take("code-1").await.unwrap(),
            Some("a@b.com".to_string())
        );
        assert_eq!(store.take("code-1").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_take_unknown_code() {
        let store = MemoryCodeStore::new();
        assert_eq!(store.take("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_code() {
        let store = MemoryCodeStore::new();
        store.put("code", "old@b.com", Duration::hours(1)).await.unwrap();
        store.put("code", "new@b.com", Duration::hours(1)).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.take("code").await.unwrap(),
            Some("new@b.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_expired_code_is_not_taken() {
        let (clock, millis) = manual_clock();
        let store = MemoryCodeStore::with_clock(clock);

        let entry = store
            .put("code", "a@b.com", Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(entry.expires_at - entry.issued_at, Duration::hours(1));

        advance(&millis, Duration::minutes(59));
        assert_eq!(store.len(), 1);

        advance(&millis, Duration::minutes(1));
        assert_eq!(store.take("code").await.unwrap(), None);
        // The expired entry is evicted by the failed take
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (clock, millis) = manual_clock();
        let store = MemoryCodeStore::with_clock(clock);

        store.put("short", "a@b.com", Duration::minutes(5)).await.unwrap();
        store.put("long", "c@d.com", Duration::hours(1)).await.unwrap();

        advance(&millis, Duration::minutes(10));

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.take("long").await.unwrap(),
            Some("c@d.com".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_take_succeeds_once() {
        let store = Arc::new(MemoryCodeStore::new());
        store.put("race", "a@b.com", Duration::hours(1)).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.take("race").await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
    }
}
