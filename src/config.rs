//! Connection settings for the time-series store and the cache.
//!
//! Everything is a literal default; nothing is read from the environment.

use std::time::Duration;

/// Settings for the InfluxDB v2 HTTP API
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base URL of the server
    pub url: String,
    /// API token, sent as `Authorization: Token <token>`
    pub token: String,
    pub org: String,
    pub bucket: String,
    /// Request timeout; `None` leaves the HTTP client default
    pub timeout: Option<Duration>,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            token: "your-influxdb-token".to_string(),
            org: "your-org".to_string(),
            bucket: "your-bucket".to_string(),
            timeout: None,
        }
    }
}

/// Settings for the Redis cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// `host:port` of the server
    pub addr: String,
    /// Expiration of cached entries; `None` keeps them forever
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:6379".to_string(),
            ttl: None,
        }
    }
}

impl CacheConfig {
    /// Connection URL understood by the redis client
    pub fn url(&self) -> String {
        format!("redis://{}/", self.addr)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub influx: InfluxConfig,
    pub cache: CacheConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.influx.url, "http://localhost:8086");
        assert_eq!(config.influx.bucket, "your-bucket");
        assert!(config.influx.timeout.is_none());
        assert_eq!(config.cache.url(), "redis://localhost:6379/");
        assert!(config.cache.ttl.is_none());
    }
}
