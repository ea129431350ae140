use chrono::{DateTime, Utc};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use signal_store::cache::RedisCache;
use signal_store::config::Config;
use signal_store::metrics;
use signal_store::signal::{SignalReader, SignalWriter};
use signal_store::storage::Record;
use signal_store::tsdb::InfluxClient;

const QUERY_START: &str = "2024-10-01T00:00:00Z";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging; stdout is reserved for results
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    let metrics_handle = match metrics::init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to initialize metrics: {}", e);
            None
        }
    };

    let config = Config::default();
    info!(url = %config.influx.url, cache = %config.cache.addr, "Starting signal-store");

    let store = match InfluxClient::new(&config.influx) {
        Ok(store) => store,
        Err(e) => {
            println!("Error creating InfluxDB client: {}", e);
            return;
        }
    };
    let cache = match RedisCache::open(&config.cache) {
        Ok(cache) => cache,
        Err(e) => {
            println!("Error creating Redis client: {}", e);
            return;
        }
    };

    let record = Record::new(vec![-127, -110, -100], "2024-10-01 22:30:31.000");

    let writer = SignalWriter::new(&store, &cache).with_ttl(config.cache.ttl);
    if let Err(e) = writer.insert(&record).await {
        println!("Error inserting data: {}", e);
        return;
    }

    let start = match DateTime::parse_from_rfc3339(QUERY_START) {
        Ok(start) => start.with_timezone(&Utc),
        Err(e) => {
            println!("Error parsing query start: {}", e);
            return;
        }
    };
    let end = Utc::now();

    let results = match SignalReader::new(&store).query(start, end).await {
        Ok(results) => results,
        Err(e) => {
            println!("Error querying data: {}", e);
            return;
        }
    };

    for result in &results {
        println!("Result: {}", result);
    }

    if let Some(handle) = metrics_handle {
        debug!(metrics = %handle.render(), "Run metrics");
    }
}
