//! The estimate record contract
//!
//! Estimates are open JSON objects: four fields are mandatory, anything
//! else the client sends is stored and returned untouched.

use serde_json::{Map, Value};
use thiserror::Error;

/// Fields every estimate record must carry
pub const REQUIRED_FIELDS: [&str; 4] = ["id", "name", "url", "timestamp"];

/// Validation errors for incoming estimate records
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimateError {
    #[error("request body is not a JSON object")]
    NotAnObject,

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Return the required fields absent from `record`, in declaration order.
pub fn missing_fields(record: &Map<String, Value>) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .filter(|f| !record.contains_key(**f))
        .copied()
        .collect()
}

/// Validate a parsed request body as an estimate record.
///
/// Returns the record's object map on success so callers can store it
/// without re-matching the `Value`.
pub fn validate_estimate(body: &Value) -> Result<&Map<String, Value>, EstimateError> {
    let record = body.as_object().ok_or(EstimateError::NotAnObject)?;
    let missing = missing_fields(record);
    if missing.is_empty() {
        Ok(record)
    } else {
        Err(EstimateError::MissingFields(missing))
    }
}
