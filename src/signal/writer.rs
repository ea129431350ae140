//! Write path: time-series point first, then the cache entry.

use std::time::Duration;
use tracing::{debug, error, info};

use super::error::SignalError;
use super::CACHE_KEY;
use crate::cache::CacheStore;
use crate::metrics;
use crate::storage::data::{Point, Record};
use crate::tsdb::TimeSeriesStore;

/// Writes records to the time-series store and then to the cache
pub struct SignalWriter<'a> {
    store: &'a dyn TimeSeriesStore,
    cache: &'a dyn CacheStore,
    ttl: Option<Duration>,
}

impl<'a> SignalWriter<'a> {
    pub fn new(store: &'a dyn TimeSeriesStore, cache: &'a dyn CacheStore) -> Self {
        Self {
            store,
            cache,
            ttl: None,
        }
    }

    /// Sets the expiration of cache entries; `None` keeps them forever
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Inserts a record.
    ///
    /// The timestamp is validated before any store is touched, and the cache is
    /// only written once the time-series store has accepted the point. A failed
    /// cache write does not undo the point.
    pub async fn insert(&self, record: &Record) -> Result<(), SignalError> {
        let result = self.try_insert(record).await;
        if let Err(e) = &result {
            metrics::record_error(e.kind());
            error!(kind = e.kind(), error = %e, "Insert failed");
        }
        result
    }

    async fn try_insert(&self, record: &Record) -> Result<(), SignalError> {
        let point = Point::from_record(record)?;

        self.store
            .write_point(&point)
            .await
            .map_err(SignalError::StoreWrite)?;
        metrics::record_point_write();
        info!(
            measurement = point.measurement(),
            timestamp = %point.timestamp(),
            samples = record.samples.len(),
            "Point written"
        );

        let payload = serde_json::to_vec(record)?;
        self.cache.set(CACHE_KEY, &payload, self.ttl).await?;
        metrics::record_cache_write(payload.len());
        debug!(key = CACHE_KEY, bytes = payload.len(), "Record cached");

        Ok(())
    }
}
