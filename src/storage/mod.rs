//! Storage module for signal-store
//! Domain records, measurement points and their wire encoding.

pub mod data;
pub mod line_protocol;

pub use data::{DataError, FieldValue, Point, Record, MEASUREMENT};
