//! Field values and their JSON-safe form
//!
//! Conversion to JSON is total:
//! - integers and strings are exact
//! - floats go through IEEE decimal text; NaN and infinities become null
//! - UUIDs render hyphenated lowercase
//! - date-times render RFC 3339 in UTC, dates as `YYYY-MM-DD`
//! - enumerations render as their name or numeric code

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

/// Enumeration member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumValue {
    /// Rendered as a string
    Name(String),
    /// Rendered as a number
    Code(i64),
}

/// A typed record field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Enum(EnumValue),
    List(Vec<FieldValue>),
    /// Embedded JSON document
    Json(Value),
}

impl FieldValue {
    /// Converts to a JSON-safe value
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::Number((*i).into()),
            FieldValue::UInt(u) => Value::Number((*u).into()),
            FieldValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Uuid(u) => Value::String(u.hyphenated().to_string()),
            FieldValue::DateTime(dt) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::Enum(EnumValue::Name(name)) => Value::String(name.clone()),
            FieldValue::Enum(EnumValue::Code(code)) => Value::Number((*code).into()),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::Json(v) => v.clone(),
        }
    }

    /// Loads a value from a dataset document.
    ///
    /// Strings that parse as a UUID, an RFC 3339 date-time or a `YYYY-MM-DD`
    /// date load as those kinds, which render back to the same text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::UInt(u)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Self::from_text(s),
            Value::Array(items) => FieldValue::List(items.iter().map(Self::from_json).collect()),
            Value::Object(_) => FieldValue::Json(value.clone()),
        }
    }

    fn from_text(s: &str) -> Self {
        if let Ok(u) = Uuid::parse_str(s) {
            if u.hyphenated().to_string() == s {
                return FieldValue::Uuid(u);
            }
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            let utc = dt.with_timezone(&Utc);
            if utc.to_rfc3339_opts(SecondsFormat::AutoSi, true) == s {
                return FieldValue::DateTime(utc);
            }
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if d.format("%Y-%m-%d").to_string() == s {
                return FieldValue::Date(d);
            }
        }
        FieldValue::Text(s.to_string())
    }

    /// Plain-text rendering used for labels and keys
    pub fn as_text(&self) -> String {
        match self.to_json() {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    /// Kind name for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::UInt(_) => "uint",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
            FieldValue::Uuid(_) => "uuid",
            FieldValue::DateTime(_) => "datetime",
            FieldValue::Date(_) => "date",
            FieldValue::Enum(_) => "enum",
            FieldValue::List(_) => "list",
            FieldValue::Json(_) => "json",
        }
    }

    /// Returns true for null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(u: u64) -> Self {
        FieldValue::UInt(u)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Uuid> for FieldValue {
    fn from(u: Uuid) -> Self {
        FieldValue::Uuid(u)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(dt: DateTime<Utc>) -> Self {
        FieldValue::DateTime(dt)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl From<EnumValue> for FieldValue {
    fn from(e: EnumValue) -> Self {
        FieldValue::Enum(e)
    }
}

impl From<Map<String, Value>> for FieldValue {
    fn from(m: Map<String, Value>) -> Self {
        FieldValue::Json(Value::Object(m))
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}
