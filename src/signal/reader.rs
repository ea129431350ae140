//! Read path: range queries over signal points.

use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, error, info};

use super::error::SignalError;
use crate::metrics;
use crate::storage::data::MEASUREMENT;
use crate::tsdb::{FluxRecord, RangeFilter, TimeSeriesStore};

/// Reads signal points back from the time-series store
pub struct SignalReader<'a> {
    store: &'a dyn TimeSeriesStore,
}

impl<'a> SignalReader<'a> {
    pub fn new(store: &'a dyn TimeSeriesStore) -> Self {
        Self { store }
    }

    /// Returns every `signal_data` row in `[start, end]`, in the order the
    /// store yields them. `start <= end` is not checked. Any cursor error
    /// discards the rows collected so far.
    pub async fn query(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FluxRecord>, SignalError> {
        let filter = RangeFilter::new(start, end, MEASUREMENT);
        debug!(%start, %end, "Querying signal data");

        let started = Instant::now();
        let result = self.collect(&filter).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(rows) => {
                metrics::record_query(elapsed_ms, rows.len());
                info!(rows = rows.len(), elapsed_ms, "Range query complete");
            }
            Err(e) => {
                metrics::record_error(e.kind());
                error!(error = %e, "Range query failed");
            }
        }
        result
    }

    async fn collect(&self, filter: &RangeFilter) -> Result<Vec<FluxRecord>, SignalError> {
        let cursor = self
            .store
            .query(filter)
            .await
            .map_err(SignalError::StoreQuery)?;

        let mut rows = Vec::new();
        for row in cursor {
            rows.push(row.map_err(SignalError::StoreQuery)?);
        }
        Ok(rows)
    }
}
