//! Flux query results.
//!
//! InfluxDB answers Flux queries with annotated CSV: every table starts with
//! `#datatype`, `#group` and `#default` rows, then a header row, then data rows.
//! The first column is reserved for annotations and is empty elsewhere.
//!
//! ```text
//! #datatype,string,long,dateTime:RFC3339,string,string
//! #group,false,false,false,true,true
//! #default,_result,,,,
//! ,result,table,_time,_value,_field
//! ,,0,2024-10-01T22:30:31Z,"[-127,-110,-100]",s
//! ```
//!
//! Errors raised while the query runs arrive in-band as a table with `error`
//! and `reference` columns.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::io;

use super::StoreError;

/// A typed cell of a query result
#[derive(Debug, Clone, PartialEq)]
pub enum FluxValue {
    String(String),
    Long(i64),
    UnsignedLong(u64),
    Double(f64),
    Boolean(bool),
    Time(DateTime<Utc>),
    Null,
}

impl FluxValue {
    /// Parses a raw cell according to its `#datatype` annotation
    fn parse(datatype: &str, raw: &str) -> Result<Self, String> {
        if raw.is_empty() && datatype != "string" {
            return Ok(FluxValue::Null);
        }

        let value = match datatype {
            "long" => raw.parse::<i64>().map(FluxValue::Long).map_err(|e| e.to_string())?,
            "unsignedLong" => raw
                .parse::<u64>()
                .map(FluxValue::UnsignedLong)
                .map_err(|e| e.to_string())?,
            "double" => raw.parse::<f64>().map(FluxValue::Double).map_err(|e| e.to_string())?,
            "boolean" => match raw {
                "true" => FluxValue::Boolean(true),
                "false" => FluxValue::Boolean(false),
                other => return Err(format!("invalid boolean {:?}", other)),
            },
            "dateTime:RFC3339" | "dateTime:RFC3339Nano" => DateTime::parse_from_rfc3339(raw)
                .map(|ts| FluxValue::Time(ts.with_timezone(&Utc)))
                .map_err(|e| e.to_string())?,
            // string, duration, base64Binary and anything unannotated
            _ => FluxValue::String(raw.to_string()),
        };
        Ok(value)
    }
}

impl fmt::Display for FluxValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FluxValue::String(v) => write!(f, "{}", v),
            FluxValue::Long(v) => write!(f, "{}", v),
            FluxValue::UnsignedLong(v) => write!(f, "{}", v),
            FluxValue::Double(v) => write!(f, "{}", v),
            FluxValue::Boolean(v) => write!(f, "{}", v),
            FluxValue::Time(v) => write!(f, "{}", v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            FluxValue::Null => write!(f, "<nil>"),
        }
    }
}

/// One row of a query result
#[derive(Debug, Clone, PartialEq)]
pub struct FluxRecord {
    table: i64,
    values: BTreeMap<String, FluxValue>,
}

impl FluxRecord {
    pub fn new(table: i64, values: BTreeMap<String, FluxValue>) -> Self {
        Self { table, values }
    }

    /// Index of the result table the row belongs to
    pub fn table(&self) -> i64 {
        self.table
    }

    pub fn values(&self) -> &BTreeMap<String, FluxValue> {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&FluxValue> {
        self.values.get(column)
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time_column("_time")
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.time_column("_start")
    }

    pub fn stop(&self) -> Option<DateTime<Utc>> {
        self.time_column("_stop")
    }

    pub fn value(&self) -> Option<&FluxValue> {
        self.get("_value")
    }

    pub fn field(&self) -> Option<&str> {
        self.string_column("_field")
    }

    pub fn measurement(&self) -> Option<&str> {
        self.string_column("_measurement")
    }

    /// Decodes `_value` as a sample sequence. Sequences are stored as JSON array
    /// strings; a plain integer value is treated as a one-element sequence.
    pub fn samples(&self) -> Option<Vec<i64>> {
        match self.value()? {
            FluxValue::String(raw) => serde_json::from_str(raw).ok(),
            FluxValue::Long(v) => Some(vec![*v]),
            _ => None,
        }
    }

    fn time_column(&self, column: &str) -> Option<DateTime<Utc>> {
        match self.get(column)? {
            FluxValue::Time(ts) => Some(*ts),
            _ => None,
        }
    }

    fn string_column(&self, column: &str) -> Option<&str> {
        match self.get(column)? {
            FluxValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FluxRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table={}", self.table)?;
        for (column, value) in &self.values {
            write!(f, " {}={}", column, value)?;
        }
        Ok(())
    }
}

/// Lazily decodes an annotated CSV response into [`FluxRecord`]s.
///
/// Rows are parsed only as the cursor advances. The first error ends the
/// iteration.
pub struct FluxCursor {
    records: csv::StringRecordsIntoIter<io::Cursor<Vec<u8>>>,
    datatypes: Vec<String>,
    defaults: Vec<String>,
    header: Option<Vec<String>>,
    done: bool,
}

impl FluxCursor {
    pub fn new(body: Vec<u8>) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(io::Cursor::new(body));

        Self {
            records: reader.into_records(),
            datatypes: Vec::new(),
            defaults: Vec::new(),
            header: None,
            done: false,
        }
    }

    fn next_record(&mut self) -> Option<Result<FluxRecord, StoreError>> {
        loop {
            let row = match self.records.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(StoreError::Csv(e))),
            };
            if row.iter().all(str::is_empty) {
                continue;
            }

            match row.get(0) {
                Some("#datatype") => {
                    // A new table starts; its header follows the annotations
                    self.datatypes = row.iter().map(str::to_string).collect();
                    self.defaults.clear();
                    self.header = None;
                    continue;
                }
                Some("#default") => {
                    self.defaults = row.iter().map(str::to_string).collect();
                    continue;
                }
                Some(annotation) if annotation.starts_with('#') => continue,
                _ => {}
            }

            if self.header.is_none() {
                self.header = Some(row.iter().map(str::to_string).collect());
                continue;
            }
            let header = self.header.as_deref().unwrap_or_default();

            if is_error_table(header) {
                let message = column_index(header, "error")
                    .and_then(|i| row.get(i))
                    .unwrap_or("unknown error");
                let reference = column_index(header, "reference")
                    .and_then(|i| row.get(i))
                    .filter(|r| !r.is_empty());
                let message = match reference {
                    Some(reference) => format!("{} (reference {})", message, reference),
                    None => message.to_string(),
                };
                return Some(Err(StoreError::Query(message)));
            }

            return Some(self.decode_row(header, &row));
        }
    }

    fn decode_row(&self, header: &[String], row: &csv::StringRecord) -> Result<FluxRecord, StoreError> {
        let mut table = 0;
        let mut values = BTreeMap::new();

        for (i, column) in header.iter().enumerate() {
            if column.is_empty() {
                continue;
            }

            let mut raw = row.get(i).unwrap_or("");
            if raw.is_empty() {
                raw = self.defaults.get(i).map(String::as_str).unwrap_or("");
            }
            let datatype = self.datatypes.get(i).map(String::as_str).unwrap_or("string");
            let value = FluxValue::parse(datatype, raw).map_err(|e| {
                StoreError::Decode(format!("column {}: {:?} as {}: {}", column, raw, datatype, e))
            })?;

            if column == "table" {
                table = match value {
                    FluxValue::Long(t) => t,
                    FluxValue::String(ref t) => t.parse().map_err(|_| {
                        StoreError::Decode(format!("invalid table index {:?}", t))
                    })?,
                    _ => 0,
                };
                continue;
            }
            values.insert(column.clone(), value);
        }

        Ok(FluxRecord::new(table, values))
    }
}

fn is_error_table(header: &[String]) -> bool {
    column_index(header, "error").is_some() && column_index(header, "reference").is_some()
}

fn column_index(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|c| c == name)
}

impl Iterator for FluxCursor {
    type Item = Result<FluxRecord, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_record();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}
