//! Common types used throughout flow-pager
//!
//! Key values, the scalar field types they come from, and the token value codec.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Token format of date-only key values
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Token format of date-and-time key values (always UTC, nanosecond precision)
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

// ============================================================================
// Key Value
// ============================================================================

/// Value of a sort key for one record
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    /// Missing value (nullable field or unset relation)
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl KeyValue {
    /// Check if this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Compare two key values.
    ///
    /// Null is lower than any other value. Numeric variants compare with each
    /// other; any other mix of variants is incomparable.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        use KeyValue::{Bool, Date, DateTime, Decimal, Float, Int, Null, Text};

        match (self, other) {
            (Null, Null) => Some(Ordering::Equal),
            (Null, _) => Some(Ordering::Less),
            (_, Null) => Some(Ordering::Greater),
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (Int(a), Int(b)) => a.partial_cmp(b),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Decimal(a), Decimal(b)) => a.partial_cmp(b),
            (Decimal(a), Int(b)) => a.partial_cmp(&rust_decimal::Decimal::from(*b)),
            (Int(a), Decimal(b)) => rust_decimal::Decimal::from(*a).partial_cmp(b),
            (Text(a), Text(b)) => a.partial_cmp(b),
            (Date(a), Date(b)) => a.partial_cmp(b),
            (DateTime(a), DateTime(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    /// Serialize for a page token.
    ///
    /// Dates and datetimes use fixed ISO-8601 profiles and decimals their exact
    /// string form, so the value survives any JSON transport unchanged.
    pub fn to_token_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            // NaN and infinities have no JSON form
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Decimal(d) => Value::String(d.to_string()),
            Self::Text(s) => Value::String(s.clone()),
            Self::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
            Self::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl From<bool> for KeyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for KeyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for KeyValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for KeyValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Utc>> for KeyValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// Field Type
// ============================================================================

/// Scalar type at the end of a key path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Boolean,
    Integer,
    Float,
    Decimal,
    Text,
    Date,
    #[serde(alias = "date_time")]
    Datetime,
}

impl FieldType {
    /// Decode a token value into a key value of this type
    pub fn decode_token_value(self, value: &Value) -> Result<KeyValue> {
        if value.is_null() {
            return Ok(KeyValue::Null);
        }

        let decoded = match (self, value) {
            (Self::Boolean, Value::Bool(b)) => Some(KeyValue::Bool(*b)),
            (Self::Integer, Value::Number(n)) => n.as_i64().map(KeyValue::Int),
            (Self::Integer, Value::String(s)) => s.trim().parse().ok().map(KeyValue::Int),
            (Self::Float, Value::Number(n)) => n.as_f64().map(KeyValue::Float),
            (Self::Decimal, Value::String(s)) => Decimal::from_str(s.trim()).ok().map(KeyValue::Decimal),
            // Go through the textual form, never through f64
            (Self::Decimal, Value::Number(n)) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
                    .map(KeyValue::Decimal)
            }
            (Self::Text, Value::String(s)) => Some(KeyValue::Text(s.clone())),
            (Self::Date, Value::String(s)) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .ok()
                .map(KeyValue::Date),
            (Self::Datetime, Value::String(s)) => parse_datetime(s).map(KeyValue::DateTime),
            _ => None,
        };

        decoded.ok_or_else(|| Error::invalid_token(format!("Invalid \"value\" for a {self} key: {value}")))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Text => "text",
            Self::Date => "date",
            Self::Datetime => "datetime",
        };
        f.write_str(name)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}
