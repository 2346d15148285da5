use crate::{Error, Result};
use time::{
    Date, PrimitiveDateTime,
    format_description::BorrowedFormatItem,
    macros::format_description,
};

/// Wire format for dates, `YYYY-MM-DD`.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Wire format for timestamps, `YYYY-MM-DD HH:MM:SS`.
pub const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// A database value, or a typed NULL.
///
/// The variant describes the column type even when the payload is `None`,
/// which lets a `Value` double as a column type prototype in field
/// declarations.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float64(Option<f64>),
    Varchar(Option<String>),
    Blob(Option<Vec<u8>>),
    Date(Option<Date>),
    Timestamp(Option<PrimitiveDateTime>),
    List(Option<Vec<Value>>),
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null
            | Value::Boolean(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::Float64(None)
            | Value::Varchar(None)
            | Value::Blob(None)
            | Value::Date(None)
            | Value::Timestamp(None)
            | Value::List(None) => true,
            _ => false,
        }
    }

    /// Widening view of any integer payload.
    pub fn integer(&self) -> Option<i64> {
        match self {
            Value::Int32(Some(v)) => Some(*v as i64),
            Value::Int64(Some(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self) -> Option<f64> {
        match self {
            Value::Float64(Some(v)) => Some(*v),
            Value::Int32(Some(v)) => Some(*v as f64),
            Value::Int64(Some(v)) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(Some(v)) => Some(*v),
            Value::Int32(Some(v)) => Some(*v != 0),
            Value::Int64(Some(v)) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Value::Varchar(Some(v)) => Some(v),
            _ => None,
        }
    }

    /// JSON view of the value, used by `Model::to_json`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            v if v.is_null() => Json::Null,
            Value::Boolean(Some(v)) => Json::Bool(*v),
            Value::Int32(Some(v)) => Json::from(*v),
            Value::Int64(Some(v)) => Json::from(*v),
            Value::Float64(Some(v)) => Json::from(*v),
            Value::Varchar(Some(v)) => Json::String(v.clone()),
            Value::Blob(Some(v)) => Json::String(format!("0x{}", hex_string(v))),
            Value::Date(Some(v)) => Json::String(
                v.format(DATE_FORMAT).unwrap_or_default(),
            ),
            Value::Timestamp(Some(v)) => Json::String(
                v.format(DATETIME_FORMAT).unwrap_or_default(),
            ),
            Value::List(Some(v)) => Json::Array(v.iter().map(Value::to_json).collect()),
            _ => Json::Null,
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02X}", b);
    }
    out
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(Some(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(Some(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(Some(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(Some(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Varchar(Some(v.to_owned()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Varchar(Some(v))
    }
}

impl From<Date> for Value {
    fn from(v: Date) -> Self {
        Value::Date(Some(v))
    }
}

impl From<PrimitiveDateTime> for Value {
    fn from(v: PrimitiveDateTime) -> Self {
        Value::Timestamp(Some(v))
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(Some(v))
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Structured values are stored as their canonical JSON text. Reading them
/// back yields that text, not the original structure.
impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        Value::Varchar(Some(
            serde_json::to_string(v).unwrap_or_else(|_| "null".to_string()),
        ))
    }
}

/// Typed extraction of a `Value` into a model field.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch<T>(expected: &str, value: &Value) -> Result<T> {
    Err(Error::decode(
        expected,
        format!("cannot read {:?} as {}", value, expected),
    ))
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.integer().map_or_else(|| mismatch("integer", value), Ok)
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self> {
        match value.integer() {
            Some(v) => i32::try_from(v)
                .map_err(|_| Error::decode("integer", format!("{} overflows i32", v))),
            None => mismatch("integer", value),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.float().map_or_else(|| mismatch("float", value), Ok)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value.boolean().map_or_else(|| mismatch("boolean", value), Ok)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v.clone()),
            Value::Timestamp(Some(v)) => v
                .format(DATETIME_FORMAT)
                .map_err(|e| Error::decode("text", e.to_string())),
            Value::Date(Some(v)) => v
                .format(DATE_FORMAT)
                .map_err(|e| Error::decode("text", e.to_string())),
            _ => mismatch("text", value),
        }
    }
}

impl FromValue for Date {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Date(Some(v)) => Ok(*v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            Value::Varchar(Some(v)) => Date::parse(v, DATE_FORMAT)
                .map_err(|e| Error::decode("date", e.to_string())),
            _ => mismatch("date", value),
        }
    }
}

impl FromValue for PrimitiveDateTime {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Timestamp(Some(v)) => Ok(*v),
            Value::Varchar(Some(v)) => PrimitiveDateTime::parse(v, DATETIME_FORMAT)
                .map_err(|e| Error::decode("timestamp", e.to_string())),
            _ => mismatch("timestamp", value),
        }
    }
}

/// A structured field reads back as the stored JSON text, wrapped in a JSON
/// string. The original structure is not reconstructed.
impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(serde_json::Value::String(v.clone())),
            v if v.is_null() => Ok(serde_json::Value::Null),
            _ => mismatch("json", value),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn typed_nulls() {
        assert!(Value::Null.is_null());
        assert!(Value::Int64(None).is_null());
        assert!(!Value::Int64(Some(0)).is_null());
        assert!(Value::Int64(None).same_type(&Value::Int64(Some(3))));
        assert!(!Value::Int64(None).same_type(&Value::Int32(None)));
    }

    #[test]
    fn integer_widening() {
        assert_eq!(Value::Int32(Some(7)).integer(), Some(7));
        assert_eq!(Value::Int64(Some(7)).integer(), Some(7));
        assert_eq!(Value::Varchar(Some("7".into())).integer(), None);
    }

    #[test]
    fn timestamp_text_parses() {
        let dt = datetime!(2015-02-09 15:33:00);
        let text = String::from_value(&Value::Timestamp(Some(dt))).unwrap();
        assert_eq!(text, "2015-02-09 15:33:00");
        let back = PrimitiveDateTime::from_value(&Value::Varchar(Some(text))).unwrap();
        assert_eq!(back, dt);
    }

    #[test]
    fn structured_values_become_text() {
        let json = serde_json::json!({"a": 1, "b": [true, null]});
        let stored = Value::from(&json);
        assert_eq!(stored.text(), Some(r#"{"a":1,"b":[true,null]}"#));
        let read = serde_json::Value::from_value(&stored).unwrap();
        assert_eq!(
            read,
            serde_json::Value::String(r#"{"a":1,"b":[true,null]}"#.into())
        );
        assert_ne!(read, json);
    }

    #[test]
    fn option_extraction() {
        assert_eq!(Option::<i64>::from_value(&Value::Int64(None)).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_value(&Value::Int64(Some(4))).unwrap(),
            Some(4)
        );
    }
}
