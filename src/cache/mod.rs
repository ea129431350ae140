//! Cache module for signal-store
//! Key-value cache seam and the Redis adapter behind it.

pub mod redis;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use self::redis::RedisCache;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid cache address {addr}: {reason}")]
    InvalidAddress { addr: String, reason: String },
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// A key-value cache holding opaque byte values
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value. `None` means
    /// the entry never expires.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError>;
}
