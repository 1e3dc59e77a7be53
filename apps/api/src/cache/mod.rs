//! Read-through cache for profile reads, backed by Redis.
//!
//! Cache failures never fail a request: callers log and fall through to the
//! store.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::ChildKind;
use crate::store::StoreResult;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A user's candidate profile row.
    Profile(Uuid),
    /// One child collection of a candidate profile.
    Children(Uuid, ChildKind),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Profile(user_id) => write!(f, "hireboard:profile:{user_id}"),
            CacheKey::Children(candidate_id, kind) => {
                write!(f, "hireboard:children:{candidate_id}:{}", kind.as_str())
            }
        }
    }
}

#[async_trait]
pub trait ReadCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    async fn put(&self, key: &CacheKey, value: &str, ttl_secs: u64) -> Result<(), CacheError>;

    async fn invalidate(&self, keys: &[CacheKey]) -> Result<(), CacheError>;
}

/// Returns the cached value for `key`, or loads it and populates the cache.
pub async fn read_through<T, F, Fut>(
    cache: &dyn ReadCache,
    key: CacheKey,
    ttl_secs: u64,
    load: F,
) -> StoreResult<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    match cache.get(&key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache hit for {key}");
                return Ok(value);
            }
            Err(e) => warn!("Discarding undecodable cache entry {key}: {e}"),
        },
        Ok(None) => {}
        Err(e) => warn!("Cache read for {key} failed: {e}"),
    }

    let value = load().await?;
    match serde_json::to_string(&value) {
        Ok(raw) => {
            if let Err(e) = cache.put(&key, &raw, ttl_secs).await {
                warn!("Cache write for {key} failed: {e}");
            }
        }
        Err(e) => warn!("Could not serialize {key} for caching: {e}"),
    }
    Ok(value)
}

/// Best-effort invalidation; failures are logged.
pub async fn invalidate_quietly(cache: &dyn ReadCache, keys: &[CacheKey]) {
    if let Err(e) = cache.invalidate(keys).await {
        warn!("Cache invalidation of {} keys failed: {e}", keys.len());
    }
}

#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    pub async fn connect(client: &redis::Client) -> Result<Self, CacheError> {
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ReadCache for RedisCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key.to_string()).await?;
        Ok(value)
    }

    async fn put(&self, key: &CacheKey, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key.to_string(), value, ttl_secs).await?;
        Ok(())
    }

    async fn invalidate(&self, keys: &[CacheKey]) -> Result<(), CacheError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let names: Vec<String> = keys.iter().map(ToString::to_string).collect();
        conn.del::<_, ()>(names).await?;
        Ok(())
    }
}
