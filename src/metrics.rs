//! Run metrics for signal-store
//!
//! Counters and histograms are recorded through the `metrics` facade into a
//! Prometheus recorder. The program runs once, so no HTTP listener is started;
//! the rendered snapshot is logged when the run ends.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder as the global metrics recorder
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a point accepted by the time-series store
pub fn record_point_write() {
    counter!("signal_store.points.written").increment(1);
}

/// Record a cache entry set
pub fn record_cache_write(bytes: usize) {
    counter!("signal_store.cache.writes").increment(1);
    counter!("signal_store.cache.bytes_written").increment(bytes as u64);
}

/// Record a completed range query
pub fn record_query(duration_ms: f64, rows: usize) {
    histogram!("signal_store.query.duration_ms").record(duration_ms);
    counter!("signal_store.query.rows").increment(rows as u64);
}

/// Record a failed operation by error kind
pub fn record_error(kind: &'static str) {
    counter!("signal_store.errors", "kind" => kind).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(rendered: &str, name: &str) -> Option<String> {
        rendered
            .lines()
            .find(|line| line.starts_with(name))
            .and_then(|line| line.rsplit(' ').next())
            .map(str::to_string)
    }

    #[test]
    fn test_metrics_render() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_point_write();
            record_cache_write(64);
            record_query(12.5, 1);
            record_error("store_write");
        });

        let rendered = handle.render();
        assert_eq!(sample(&rendered, "signal_store_points_written").as_deref(), Some("1"));
        assert_eq!(sample(&rendered, "signal_store_cache_bytes_written").as_deref(), Some("64"));
        assert_eq!(sample(&rendered, "signal_store_query_rows").as_deref(), Some("1"));
        assert_eq!(sample(&rendered, "signal_store_errors").as_deref(), Some("1"));
        assert!(rendered.contains("kind=\"store_write\""));
    }
}
