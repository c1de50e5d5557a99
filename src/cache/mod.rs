pub mod keys;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

const TTL_JITTER_RATIO: f64 = 0.1;

/// Opaque key-value blob store with TTL. Both calls are best-effort: a
/// failing store must never fail the surrounding prediction or feedback
/// call, so errors are swallowed here.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, payload: String, ttl: Duration);
}

#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    pub fn new(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_multiplexed_tokio_connection().await?;
        Ok(Self::new(connection))
    }

    pub async fn is_connected(&self) -> bool {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}

#[async_trait]
impl BlobStore for RedisStore {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.connection.clone();
        let payload: Option<String> = conn.get(key).await.ok()?;
        payload
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) {
        let mut conn = self.connection.clone();
        if !ttl.is_zero() {
            let ttl = apply_ttl_jitter(ttl);
            let ttl_secs = ttl.as_secs().max(1);
            let _: Result<(), _> = conn.set_ex(key, payload, ttl_secs).await;
        } else {
            let _: Result<(), _> = conn.set(key, payload).await;
        }
    }
}

/// In-process fallback used when no redis is reachable, and by the test
/// suite. Honors TTL on read.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        let expired = matches!(
            entries.get(key),
            Some((_, Some(expiry))) if *expiry <= Instant::now()
        );
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|(payload, _)| payload.clone())
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) {
        let expiry = if ttl.is_zero() {
            None
        } else {
            Instant::now().checked_add(ttl)
        };
        self.entries.lock().insert(key.to_owned(), (payload, expiry));
    }
}

fn apply_ttl_jitter(ttl: Duration) -> Duration {
    let base_ms = ttl.as_millis() as f64;
    let mut rng = rand::rng();
    let factor = rng.random_range(1.0 - TTL_JITTER_RATIO..=1.0 + TTL_JITTER_RATIO);
    let jittered_ms = (base_ms * factor).round().max(1.0);
    Duration::from_millis(jittered_ms as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_payloads() {
        let store = MemoryStore::new();
        store.set("k", "v".to_string(), Duration::ZERO).await;
        assert_eq!(store.get("k").await.as_deref(), Some("v"));
        assert_eq!(store.get("missing").await, None);
    }

    #[tokio::test]
    async fn memory_store_expires_entries() {
        let store = MemoryStore::new();
        store.set("k", "v".to_string(), Duration::from_millis(5)).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.get("k").await, None);
        assert!(store.is_empty());
    }

    #[test]
    fn jitter_stays_within_ratio() {
        let ttl = Duration::from_secs(1000);
        for _ in 0..100 {
            let jittered = apply_ttl_jitter(ttl).as_secs_f64();
            assert!((900.0..=1100.0).contains(&jittered.round()));
        }
    }
}
