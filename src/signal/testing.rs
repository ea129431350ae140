//! In-memory stores for exercising the writer and reader without servers.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::cache::{CacheError, CacheStore};
use crate::storage::data::{FieldValue, Point};
use crate::storage::line_protocol::encode_sequence;
use crate::tsdb::{FluxRecord, FluxValue, RangeFilter, RecordCursor, StoreError, TimeSeriesStore};

#[derive(Default)]
pub struct MemoryStore {
    points: Mutex<Vec<Point>>,
    write_attempts: AtomicUsize,
    fail_writes: bool,
    fail_queries: bool,
    fail_cursor: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn failing_queries() -> Self {
        Self {
            fail_queries: true,
            ..Self::default()
        }
    }

    /// Yields the matching rows, then an error
    pub fn failing_cursor() -> Self {
        Self {
            fail_cursor: true,
            ..Self::default()
        }
    }

    pub fn points(&self) -> Vec<Point> {
        self.points.lock().unwrap().clone()
    }

    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

fn unavailable() -> StoreError {
    StoreError::Status {
        status: 503,
        message: "store unavailable".to_string(),
    }
}

fn to_flux_value(value: &FieldValue) -> FluxValue {
    match value {
        FieldValue::Integer(v) => FluxValue::Long(*v),
        FieldValue::Float(v) => FluxValue::Double(*v),
        FieldValue::Boolean(v) => FluxValue::Boolean(*v),
        FieldValue::String(v) => FluxValue::String(v.clone()),
        FieldValue::IntegerSequence(v) => FluxValue::String(encode_sequence(v)),
    }
}

#[async_trait]
impl TimeSeriesStore for MemoryStore {
    async fn write_point(&self, point: &Point) -> Result<(), StoreError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(unavailable());
        }
        self.points.lock().unwrap().push(point.clone());
        Ok(())
    }

    async fn query(&self, filter: &RangeFilter) -> Result<RecordCursor, StoreError> {
        if self.fail_queries {
            return Err(unavailable());
        }

        let mut rows: Vec<Result<FluxRecord, StoreError>> = Vec::new();
        for point in self.points.lock().unwrap().iter() {
            if point.measurement() != filter.measurement || !filter.contains(point.timestamp()) {
                continue;
            }
            for (field, value) in point.fields() {
                let mut values = BTreeMap::new();
                values.insert("_time".to_string(), FluxValue::Time(point.timestamp()));
                values.insert(
                    "_measurement".to_string(),
                    FluxValue::String(point.measurement().to_string()),
                );
                values.insert("_field".to_string(), FluxValue::String(field.clone()));
                values.insert("_value".to_string(), to_flux_value(value));
                rows.push(Ok(FluxRecord::new(0, values)));
            }
        }
        if self.fail_cursor {
            rows.push(Err(StoreError::Query("connection reset mid-stream".to_string())));
        }

        Ok(Box::new(rows.into_iter()))
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Vec<u8>, Option<Duration>)>>,
    set_attempts: AtomicUsize,
    fail: bool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<(Vec<u8>, Option<Duration>)> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn set_attempts(&self) -> usize {
        self.set_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError> {
        self.set_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CacheError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "cache unavailable",
            ))));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_vec(), ttl));
        Ok(())
    }
}
