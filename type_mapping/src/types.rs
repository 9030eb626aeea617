//! Runtime value model
//!
//! [`SqlValue`] is what callers hand to the write paths and predicates.
//! [`BindValue`] is the narrower set of parameter types that are bound to a
//! statement after encoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fragment::SqlFragment;

/// A value destined for a column
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    /// Any JSON value: scalars, objects or arrays
    Json(serde_json::Value),
    /// A native date/time value
    Timestamp(DateTime<Utc>),
    /// Pre-built SQL expression with its own parameters
    Raw(SqlFragment),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null | SqlValue::Json(serde_json::Value::Null))
    }

    /// Build a raw SQL expression value
    pub fn raw(fragment: SqlFragment) -> Self {
        SqlValue::Raw(fragment)
    }
}

impl From<String> for SqlValue {
    fn from(val: String) -> Self {
        SqlValue::Json(serde_json::Value::String(val))
    }
}

impl From<&str> for SqlValue {
    fn from(val: &str) -> Self {
        SqlValue::Json(serde_json::Value::String(val.to_string()))
    }
}

impl From<i16> for SqlValue {
    fn from(val: i16) -> Self {
        SqlValue::Json(val.into())
    }
}

impl From<i32> for SqlValue {
    fn from(val: i32) -> Self {
        SqlValue::Json(val.into())
    }
}

impl From<i64> for SqlValue {
    fn from(val: i64) -> Self {
        SqlValue::Json(val.into())
    }
}

impl From<f64> for SqlValue {
    fn from(val: f64) -> Self {
        SqlValue::Json(val.into())
    }
}

impl From<bool> for SqlValue {
    fn from(val: bool) -> Self {
        SqlValue::Json(serde_json::Value::Bool(val))
    }
}

impl From<Uuid> for SqlValue {
    fn from(val: Uuid) -> Self {
        SqlValue::Json(serde_json::Value::String(val.to_string()))
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(val: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(val)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(val: serde_json::Value) -> Self {
        SqlValue::Json(val)
    }
}

impl From<SqlFragment> for SqlValue {
    fn from(val: SqlFragment) -> Self {
        SqlValue::Raw(val)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// A single statement parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BindValue {
    Text(Option<String>),
    TextArray(Vec<Option<String>>),
    Integer(i32),
    BigInt(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl BindValue {
    /// Pick a parameter type for an untyped JSON value.
    ///
    /// Strings that parse as RFC 3339 timestamps or UUIDs are bound with those
    /// types; integers that fit `i32` are bound as `INTEGER`.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    BindValue::Timestamp(dt.with_timezone(&Utc))
                } else if let Ok(uuid) = Uuid::parse_str(&s) {
                    BindValue::Uuid(uuid)
                } else {
                    BindValue::Text(Some(s))
                }
            }
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => BindValue::Integer(small),
                        Err(_) => BindValue::BigInt(i),
                    }
                } else if let Some(f) = n.as_f64() {
                    BindValue::Float(f)
                } else {
                    BindValue::Text(Some(n.to_string()))
                }
            }
            serde_json::Value::Bool(b) => BindValue::Boolean(b),
            serde_json::Value::Null => BindValue::Text(None),
            other => BindValue::Json(other),
        }
    }
}

impl From<String> for BindValue {
    fn from(val: String) -> Self {
        BindValue::Text(Some(val))
    }
}

impl From<&str> for BindValue {
    fn from(val: &str) -> Self {
        BindValue::Text(Some(val.to_string()))
    }
}

impl From<i32> for BindValue {
    fn from(val: i32) -> Self {
        BindValue::Integer(val)
    }
}

impl From<i64> for BindValue {
    fn from(val: i64) -> Self {
        BindValue::BigInt(val)
    }
}

impl From<f64> for BindValue {
    fn from(val: f64) -> Self {
        BindValue::Float(val)
    }
}

impl From<bool> for BindValue {
    fn from(val: bool) -> Self {
        BindValue::Boolean(val)
    }
}

impl From<Uuid> for BindValue {
    fn from(val: Uuid) -> Self {
        BindValue::Uuid(val)
    }
}

impl From<DateTime<Utc>> for BindValue {
    fn from(val: DateTime<Utc>) -> Self {
        BindValue::Timestamp(val)
    }
}

impl From<serde_json::Value> for BindValue {
    fn from(val: serde_json::Value) -> Self {
        BindValue::from_json(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_into_sql_value() {
        let none: Option<i32> = None;
        assert_eq!(SqlValue::from(none), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(3)), SqlValue::Json(json!(3)));
    }

    #[test]
    fn test_json_null_is_null() {
        assert!(SqlValue::Json(json!(null)).is_null());
        assert!(SqlValue::Null.is_null());
        assert!(!SqlValue::from("x").is_null());
    }

    #[test]
    fn test_bind_value_from_json_detects_types() {
        assert_eq!(BindValue::from_json(json!(7)), BindValue::Integer(7));
        assert_eq!(
            BindValue::from_json(json!(5_000_000_000i64)),
            BindValue::BigInt(5_000_000_000)
        );
        assert_eq!(BindValue::from_json(json!(1.5)), BindValue::Float(1.5));
        assert_eq!(BindValue::from_json(json!(true)), BindValue::Boolean(true));
        assert_eq!(BindValue::from_json(json!(null)), BindValue::Text(None));
        assert!(matches!(
            BindValue::from_json(json!("2024-01-01T00:00:00Z")),
            BindValue::Timestamp(_)
        ));
        assert!(matches!(
            BindValue::from_json(json!("67e55044-10b1-426f-9247-bb680e5fe0c8")),
            BindValue::Uuid(_)
        ));
        assert_eq!(
            BindValue::from_json(json!("prairie")),
            BindValue::Text(Some("prairie".to_string()))
        );
        assert_eq!(
            BindValue::from_json(json!({"a": 1})),
            BindValue::Json(json!({"a": 1}))
        );
    }
}
