//! Heifer records
//!
//! Maps the service's JSON objects (keys such as `"Birth Wt"` and `"Brd"`) onto
//! a typed `Heifer`. Every key in [`REQUIRED_FIELDS`] must be present.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Timestamp format used by the service
const SOURCE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date format used when a record is serialized
const OUTPUT_DATE_FORMAT: &str = "%m/%d/%Y";

/// JSON keys that every record must carry
pub const REQUIRED_FIELDS: [&str; 13] = [
    "Age", "BCC", "BCS", "Birth Wt", "Birthdate", "Brd", "Date", "Hip", "Index", "LADG", "Loc",
    "MADG", "Wt",
];

/// Errors raised while building a record from JSON
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    /// A required key is absent
    #[error("The given information was incomplete: missing '{0}'")]
    MissingField(String),

    /// A key is present but its value has the wrong shape
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

/// A single heifer measurement from the service
///
/// Serializes with lower-case keys and `MM/DD/YYYY` dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heifer {
    /// Age (`Age`)
    #[serde(serialize_with = "serialize_number")]
    pub age: f64,
    /// Body condition class (`BCC`)
    #[serde(serialize_with = "serialize_number")]
    pub bcc: f64,
    /// Body condition score (`BCS`)
    #[serde(serialize_with = "serialize_number")]
    pub bcs: f64,
    /// Birth weight (`Birth Wt`)
    #[serde(serialize_with = "serialize_number")]
    pub birth_weight: f64,
    /// Birth date (`Birthdate`)
    #[serde(serialize_with = "serialize_date")]
    pub birth_date: NaiveDateTime,
    /// Breed code (`Brd`)
    pub breed: String,
    /// Measurement date (`Date`)
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDateTime,
    /// Hip tag (`Hip`)
    pub hip: i64,
    /// Record index (`Index`)
    pub index: i64,
    /// Lifetime average daily gain (`LADG`)
    #[serde(serialize_with = "serialize_number")]
    pub ladg: f64,
    /// Location (`Loc`)
    pub loc: String,
    /// Most recent average daily gain (`MADG`)
    #[serde(serialize_with = "serialize_number")]
    pub madg: f64,
    /// Weight (`Wt`)
    #[serde(serialize_with = "serialize_number")]
    pub weight: f64,
}

impl Heifer {
    /// Builds a record from one JSON object.
    ///
    /// All required keys are checked before any value is converted, so a
    /// missing key is always reported as `MissingField`.
    pub fn from_json(object: &Map<String, Value>) -> Result<Self, RecordError> {
        if let Some(missing) = REQUIRED_FIELDS.iter().find(|key| !object.contains_key(**key)) {
            return Err(RecordError::MissingField(missing.to_string()));
        }

        Ok(Heifer {
            age: number(object, "Age")?,
            bcc: number(object, "BCC")?,
            bcs: number(object, "BCS")?,
            birth_weight: number(object, "Birth Wt")?,
            birth_date: timestamp(object, "Birthdate")?,
            breed: text(object, "Brd")?,
            date: timestamp(object, "Date")?,
            hip: integer(object, "Hip")?,
            index: integer(object, "Index")?,
            ladg: number(object, "LADG")?,
            loc: text(object, "Loc")?,
            madg: number(object, "MADG")?,
            weight: number(object, "Wt")?,
        })
    }
}

impl fmt::Display for Heifer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Heifer Index: {}, Breed: {}>", self.index, self.breed)
    }
}

fn serialize_date<S: Serializer>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(OUTPUT_DATE_FORMAT))
}

/// Whole numbers are written without a fractional part (`412`, not `412.0`)
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    match integral(*value) {
        Some(whole) => serializer.serialize_i64(whole),
        None => serializer.serialize_f64(*value),
    }
}

/// `value` as an `i64` when it is whole and fits without saturating
fn integral(value: f64) -> Option<i64> {
    // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}

fn invalid(field: &str, reason: impl Into<String>) -> RecordError {
    RecordError::InvalidField {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn field<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a Value, RecordError> {
    object
        .get(key)
        .ok_or_else(|| RecordError::MissingField(key.to_string()))
}

/// Accepts JSON numbers and numeric strings
fn number(object: &Map<String, Value>, key: &str) -> Result<f64, RecordError> {
    match field(object, key)? {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(key, "number out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(key, format!("'{}' is not a number: {}", s, e))),
        other => Err(invalid(key, format!("expected a number, found {}", other))),
    }
}

fn integer(object: &Map<String, Value>, key: &str) -> Result<i64, RecordError> {
    match field(object, key)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral))
            .ok_or_else(|| invalid(key, format!("{} is not an integer", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| invalid(key, format!("'{}' is not an integer: {}", s, e))),
        other => Err(invalid(key, format!("expected an integer, found {}", other))),
    }
}

/// Accepts strings, and numbers rendered as text
fn text(object: &Map<String, Value>, key: &str) -> Result<String, RecordError> {
    match field(object, key)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(invalid(key, format!("expected a string, found {}", other))),
    }
}

fn timestamp(object: &Map<String, Value>, key: &str) -> Result<NaiveDateTime, RecordError> {
    match field(object, key)? {
        Value::String(s) => NaiveDateTime::parse_from_str(s, SOURCE_DATE_FORMAT)
            .map_err(|e| invalid(key, format!("'{}' is not a timestamp: {}", s, e))),
        other => Err(invalid(key, format!("expected a timestamp, found {}", other))),
    }
}
