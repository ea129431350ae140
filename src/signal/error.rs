//! Errors of the signal write and read paths.

use thiserror::Error;

use crate::cache::CacheError;
use crate::storage::data::DataError;
use crate::tsdb::StoreError;

/// Errors surfaced by the signal writer and reader. Each one ends the
/// operation that raised it.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("invalid time format: {0}")]
    Format(#[from] DataError),
    #[error("failed to marshal data: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to write point: {0}")]
    StoreWrite(#[source] StoreError),
    #[error("failed to set cache data: {0}")]
    CacheWrite(#[from] CacheError),
    #[error("failed to query data: {0}")]
    StoreQuery(#[source] StoreError),
}

impl SignalError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            SignalError::Format(_) => "format",
            SignalError::Serialization(_) => "serialization",
            SignalError::StoreWrite(_) => "store_write",
            SignalError::CacheWrite(_) => "cache_write",
            SignalError::StoreQuery(_) => "store_query",
        }
    }
}
