//! Response cache for read-mostly listings
//!
//! A key → (value, expiry) map. Values are stored type-erased and
//! downcast on read, so one cache serves every cached endpoint. There is
//! no capacity bound: the key space is a handful of catalog endpoints.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    expires_at: Instant,
}

/// TTL cache shared by clones of a client
pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    /// Create a cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Default lifetime of new entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a live entry of type `T`
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Store a value with the default lifetime
    pub async fn insert<T>(&self, key: impl Into<String>, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.insert_with_ttl(key, value, self.ttl).await;
    }

    /// Store a value with an explicit lifetime
    pub async fn insert_with_ttl<T>(&self, key: impl Into<String>, value: T, ttl: Duration)
    where
        T: Send + Sync + 'static,
    {
        let entry = CacheEntry {
            value: Arc::new(value),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Drop every entry
    pub async fn invalidate(&self) {
        self.entries.write().await.clear();
    }

    /// Drop every entry cached for `endpoint`, whatever the options
    pub async fn invalidate_endpoint(&self, endpoint: &str) {
        let prefix = format!("{endpoint}?");
        self.entries
            .write()
            .await
            .retain(|key, _| key != endpoint && !key.starts_with(&prefix));
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
