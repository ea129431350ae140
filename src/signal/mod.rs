//! Signal module for signal-store
//! Writes signal records to the time-series store and cache, and reads them back by time range.

pub mod error;
pub mod reader;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use error::SignalError;
pub use reader::SignalReader;
pub use writer::SignalWriter;

/// Cache key holding the latest record
pub const CACHE_KEY: &str = "signal_data";
