//! InfluxDB line protocol encoding for points.
//!
//! `measurement[,tag=value...] field=value[,field=value...] timestamp_ns`

use std::fmt::Write;

use super::data::{FieldValue, Point};

/// Encodes a point as a single line protocol line (without trailing newline)
pub fn encode_point(point: &Point) -> String {
    let mut line = String::new();
    escape_into(&mut line, point.measurement(), &[',', ' ']);

    for (key, value) in point.tags() {
        line.push(',');
        escape_into(&mut line, key, &[',', '=', ' ']);
        line.push('=');
        escape_into(&mut line, value, &[',', '=', ' ']);
    }

    let mut first = true;
    for (key, value) in point.fields() {
        line.push(if first { ' ' } else { ',' });
        first = false;
        escape_into(&mut line, key, &[',', '=', ' ']);
        line.push('=');
        encode_field_value(&mut line, value);
    }

    // Nanosecond precision; out-of-range timestamps fall back to microseconds
    match point.timestamp().timestamp_nanos_opt() {
        Some(nanos) => {
            let _ = write!(line, " {}", nanos);
        }
        None => {
            let _ = write!(line, " {}000", point.timestamp().timestamp_micros());
        }
    }

    line
}

fn encode_field_value(out: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Integer(v) => {
            let _ = write!(out, "{}i", v);
        }
        FieldValue::Float(v) => {
            let _ = write!(out, "{:?}", v);
        }
        FieldValue::Boolean(v) => out.push_str(if *v { "true" } else { "false" }),
        FieldValue::String(v) => quote_into(out, v),
        FieldValue::IntegerSequence(values) => quote_into(out, &encode_sequence(values)),
    }
}

/// Compact JSON array text, e.g. `[-127,-110,-100]`
pub fn encode_sequence(values: &[i64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

fn quote_into(out: &mut String, value: &str) {
    out.push('"');
    escape_into(out, value, &['"', '\\']);
    out.push('"');
}

fn escape_into(out: &mut String, value: &str, special: &[char]) {
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
