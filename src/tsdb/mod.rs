//! Time-series store module for signal-store
//! The store seam used by the signal writer and reader, plus the InfluxDB adapter.

pub mod flux;
pub mod influx;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use thiserror::Error;

use crate::storage::data::Point;
pub use flux::{FluxCursor, FluxRecord, FluxValue};
pub use influx::InfluxClient;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Server responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed query response: {0}")]
    Decode(String),
    #[error("Query failed: {0}")]
    Query(String),
}

/// Lazy, forward-only sequence of query rows
pub type RecordCursor = Box<dyn Iterator<Item = Result<FluxRecord, StoreError>> + Send>;

/// Selects every point of one measurement inside a closed time window
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub measurement: String,
}

impl RangeFilter {
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>, measurement: impl Into<String>) -> Self {
        Self {
            start,
            stop,
            measurement: measurement.into(),
        }
    }

    /// Whether a timestamp falls inside `[start, stop]`
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.stop
    }

    /// Renders the filter as a Flux query against `bucket`.
    ///
    /// Flux treats `stop` as exclusive, so one nanosecond is added to keep the
    /// window closed.
    pub fn to_flux(&self, bucket: &str) -> String {
        let stop = self.stop + Duration::nanoseconds(1);
        format!(
            "from(bucket: \"{}\")\n  |> range(start: {}, stop: {})\n  |> filter(fn: (r) => r._measurement == \"{}\")",
            escape_flux_string(bucket),
            self.start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            stop.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            escape_flux_string(&self.measurement),
        )
    }
}

fn escape_flux_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A time-series store that accepts points and answers range queries
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Writes a single point, returning once the store has accepted it
    async fn write_point(&self, point: &Point) -> Result<(), StoreError>;

    /// Submits a range query and returns a cursor over the matching rows
    async fn query(&self, filter: &RangeFilter) -> Result<RecordCursor, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_range_filter_flux() {
        let start = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        let stop = Utc.with_ymd_and_hms(2024, 10, 2, 0, 0, 0).unwrap();
        let filter = RangeFilter::new(start, stop, "signal_data");

        assert_eq!(
            filter.to_flux("your-bucket"),
            "from(bucket: \"your-bucket\")\n  |> range(start: 2024-10-01T00:00:00Z, stop: 2024-10-02T00:00:00.000000001Z)\n  |> filter(fn: (r) => r._measurement == \"signal_data\")"
        );
    }

    #[test]
    fn test_range_filter_escapes_names() {
        let now = Utc::now();
        let filter = RangeFilter::new(now, now, r#"a"b"#);
        let flux = filter.to_flux(r"my\bucket");
        assert!(flux.contains(r#"from(bucket: "my\\bucket")"#));
        assert!(flux.contains(r#"r._measurement == "a\"b""#));
    }

    #[test]
    fn test_range_filter_contains_is_closed() {
        let start = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        let stop = Utc.with_ymd_and_hms(2024, 10, 2, 0, 0, 0).unwrap();
        let filter = RangeFilter::new(start, stop, "signal_data");

        assert!(filter.contains(start));
        assert!(filter.contains(stop));
        assert!(!filter.contains(stop + Duration::nanoseconds(1)));
        assert!(!filter.contains(start - Duration::seconds(1)));
    }
}
