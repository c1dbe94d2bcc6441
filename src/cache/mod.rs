/// Session cache
///
/// Read-through cache of sanitized principal projections keyed by
/// `user:{id}:{role}`. The backend is a shared key-value resource; an outage
/// is never allowed to fail the request that touched it.

use async_trait::async_trait;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::principal::{Role, SessionProfile};

mod memory;
mod redis_cache;

pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheError {
    Unavailable(String),
    Command(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Unavailable(msg) => write!(f, "Cache unavailable: {}", msg),
            CacheError::Command(msg) => write!(f, "Cache command failed: {}", msg),
        }
    }
}

impl StdError for CacheError {}

#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Overwrites any existing value
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

pub fn cache_key(id: &str, role: Role) -> String {
    format!("user:{}:{}", id, role)
}

/// Profile-level view over a `CacheBackend`
#[derive(Clone)]
pub struct ProfileCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl ProfileCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Cached projection, or `None` on miss, backend failure or a value that
    /// no longer decodes
    pub async fn get(&self, id: &str, role: Role) -> Option<SessionProfile> {
        let key = cache_key(id, role);
        let raw = match self.backend.get(&key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn populate(&self, id: &str, role: Role, profile: &SessionProfile) {
        let key = cache_key(id, role);
        let value = match serde_json::to_string(profile) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to serialize session profile");
                return;
            }
        };

        if let Err(e) = self.backend.set(&key, &value, self.ttl).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed, skipping population");
        }
    }

    pub async fn invalidate(&self, id: &str, role: Role) {
        let key = cache_key(id, role);
        if let Err(e) = self.backend.delete(&key).await {
            tracing::warn!(key = %key, error = %e, "Cache invalidation failed");
        }
    }
}
