//! signal-store - writes signal samples to a time series database and a cache
//!
//! A record is written as a point to InfluxDB and as JSON to Redis, then read
//! back with a time-range query.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod signal;
pub mod storage;
pub mod tsdb;
