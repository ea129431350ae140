use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Measurement every signal point is written under
pub const MEASUREMENT: &str = "signal_data";

/// Field holding the sample sequence
pub const SAMPLES_FIELD: &str = "s";

/// Layout of `Record::updated_at`, e.g. `2024-10-01 22:30:31.000`
pub const UPDATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
    #[error("Invalid measurement name: {0}")]
    InvalidMeasurement(String),
}

/// A signal sample as produced by the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Fixed-point signal readings
    #[serde(rename = "s")]
    pub samples: Vec<i64>,
    /// Sample time, see [`UPDATED_AT_FORMAT`]
    #[serde(rename = "updateat")]
    pub updated_at: String,
}

impl Record {
    pub fn new(samples: Vec<i64>, updated_at: impl Into<String>) -> Self {
        Self {
            samples,
            updated_at: updated_at.into(),
        }
    }

    /// Parses `updated_at` as a UTC timestamp
    pub fn timestamp(&self) -> Result<DateTime<Utc>, DataError> {
        parse_updated_at(&self.updated_at)
    }
}

/// Parses a `YYYY-MM-DD HH:MM:SS.mmm` string. The layout carries no zone, so the
/// value is taken as UTC.
///
/// chrono tolerates a missing fraction, unpadded fields and leading
/// whitespace; the value must format back to itself exactly.
pub fn parse_updated_at(value: &str) -> Result<DateTime<Utc>, DataError> {
    let naive = NaiveDateTime::parse_from_str(value, UPDATED_AT_FORMAT).map_err(|e| {
        DataError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;

    if naive.format(UPDATED_AT_FORMAT).to_string() != value {
        return Err(DataError::InvalidTimestamp {
            value: value.to_string(),
            reason: "does not match YYYY-MM-DD HH:MM:SS.mmm".to_string(),
        });
    }

    Ok(naive.and_utc())
}

/// Typed value of a point field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    /// Stored as a JSON array string, InfluxDB has no array field type
    IntegerSequence(Vec<i64>),
}

impl From<Vec<i64>> for FieldValue {
    fn from(values: Vec<i64>) -> Self {
        FieldValue::IntegerSequence(values)
    }
}

/// A single measurement point ready to be handed to a time-series store
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: DateTime<Utc>,
}

impl Point {
    /// Creates an empty point for the given measurement
    pub fn new(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> Result<Self, DataError> {
        let measurement = measurement.into();
        if measurement.is_empty() {
            return Err(DataError::InvalidMeasurement(
                "Measurement name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            measurement,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        })
    }

    /// Builds the `signal_data` point for a record
    pub fn from_record(record: &Record) -> Result<Self, DataError> {
        let timestamp = record.timestamp()?;
        Ok(Self::new(MEASUREMENT, timestamp)?
            .with_field(SAMPLES_FIELD, record.samples.clone()))
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
