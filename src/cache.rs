//! Timestamped key/value cache for exchange reads.
//!
//! Entries older than the caller's TTL are treated as missing. Nothing is
//! evicted automatically; stale entries are overwritten on the next insert.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, (Instant, V)>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key` if it was inserted less than `ttl` ago.
    pub async fn get(&self, key: &K, ttl: Duration) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|(inserted, _)| inserted.elapsed() < ttl)
            .map(|(_, value)| value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        self.entries.write().await.insert(key, (Instant::now(), value));
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_entry_is_returned() {
        let cache = TtlCache::new();
        cache.insert("portfolio", 42).await;
        assert_eq!(cache.get(&"portfolio", Duration::from_secs(5)).await, Some(42));
        assert_eq!(cache.get(&"account", Duration::from_secs(5)).await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_missing() {
        let cache = TtlCache::new();
        cache.insert("BTC", 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get(&"BTC", Duration::from_millis(5)).await, None);
        // Still stored until overwritten or cleared
        assert_eq!(cache.len().await, 1);
    }

    #[test]
    fn test_invalidate_and_clear() {
        tokio_test::block_on(async {
            let cache = TtlCache::new();
            cache.insert(1, "a").await;
            cache.insert(2, "b").await;
            cache.invalidate(&1).await;
            assert_eq!(cache.get(&1, Duration::from_secs(60)).await, None);
            cache.clear().await;
            assert!(cache.is_empty().await);
        });
    }
}
