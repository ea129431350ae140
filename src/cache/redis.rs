//! Redis adapter for the cache.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{CacheError, CacheStore};
use crate::config::CacheConfig;

/// Redis-backed cache.
///
/// The connection is opened on first use and then shared for the lifetime of
/// the process.
pub struct RedisCache {
    client: redis::Client,
    addr: String,
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisCache {
    /// Validates the address without connecting
    pub fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.url()).map_err(|e| CacheError::InvalidAddress {
            addr: config.addr.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            addr: config.addr.clone(),
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                let conn = self.client.get_multiplexed_async_connection().await?;
                info!(addr = %self.addr, "Connected to Redis");
                Ok::<_, CacheError>(conn)
            })
            .await?;
        // Multiplexed handles are cheap clones of one connection
        Ok(conn.clone())
    }
}

/// Builds `SET key value [PX ttl_ms]`
fn set_command(key: &str, value: &[u8], ttl: Option<Duration>) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);
    if let Some(ttl) = ttl {
        cmd.arg("PX").arg(ttl.as_millis().max(1) as u64);
    }
    cmd
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = set_command(key, value, ttl).query_async(&mut conn).await?;
        debug!(key, bytes = value.len(), ?ttl, "Cache entry set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(cmd: &redis::Cmd) -> String {
        String::from_utf8(cmd.get_packed_command()).unwrap()
    }

    #[test]
    fn test_set_command_without_ttl() {
        let cmd = set_command("signal_data", b"{}", None);
        assert_eq!(
            packed(&cmd),
            "*3\r\n$3\r\nSET\r\n$11\r\nsignal_data\r\n$2\r\n{}\r\n"
        );
    }

    #[test]
    fn test_set_command_with_ttl() {
        let cmd = set_command("k", b"v", Some(Duration::from_secs(2)));
        assert_eq!(
            packed(&cmd),
            "*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nPX\r\n$4\r\n2000\r\n"
        );
    }

    #[test]
    fn test_open_rejects_bad_address() {
        let config = CacheConfig {
            addr: "localhost:notaport".to_string(),
            ttl: None,
        };
        assert!(matches!(
            RedisCache::open(&config),
            Err(CacheError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_open_does_not_connect() {
        // Nothing listens here; opening must still succeed
        let config = CacheConfig {
            addr: "127.0.0.1:1".to_string(),
            ttl: None,
        };
        assert!(RedisCache::open(&config).is_ok());
    }

    #[tokio::test]
    async fn test_set_fails_when_unreachable() {
        let config = CacheConfig {
            addr: "127.0.0.1:1".to_string(),
            ttl: None,
        };
        let cache = RedisCache::open(&config).unwrap();
        assert!(matches!(
            cache.set("signal_data", b"{}", None).await,
            Err(CacheError::Redis(_))
        ));
    }
}
