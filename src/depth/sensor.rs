//! Parsing of the pressure sensor's text records.
//!
//! The sensor driver publishes a fixed-layout line per sample; the depth in
//! meters occupies the five characters starting at offset 7, e.g.
//! `"Depth: 1.234 m Temp: 12.80 C"`.

use thiserror::Error;

const DEPTH_FIELD_START: usize = 7;
const DEPTH_FIELD_LEN: usize = 5;

#[derive(Debug, Error, PartialEq)]
pub enum SensorError {
    #[error("Depth record too short: {0:?}")]
    TruncatedRecord(String),

    #[error("Invalid depth field {field:?} in record {record:?}")]
    InvalidDepth { field: String, record: String },
}

/// Extracts the depth from a raw sensor record. Negative depths read as 0.
pub fn parse_depth_record(record: &str) -> Result<f64, SensorError> {
    let field: String = record
        .chars()
        .skip(DEPTH_FIELD_START)
        .take(DEPTH_FIELD_LEN)
        .collect();
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Err(SensorError::TruncatedRecord(record.to_string()));
    }

    let depth: f64 = trimmed.parse().map_err(|_| SensorError::InvalidDepth {
        field: field.clone(),
        record: record.to_string(),
    })?;
    if !depth.is_finite() {
        return Err(SensorError::InvalidDepth {
            field,
            record: record.to_string(),
        });
    }

    Ok(depth.max(0.0))
}
