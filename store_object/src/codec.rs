//! Value encoding
//!
//! Turns a [`SqlValue`] plus the target column's descriptor into a
//! parameterized SQL expression. Rules are tried in order and the first match
//! wins:
//!
//! 1. null becomes `NULL`
//! 2. array columns get a typed array built from a text array parameter
//! 3. structured values for geometry columns go through `ST_GeomFromGeoJSON`
//! 4. native timestamps for timestamp columns are bound as `timestamptz`
//! 5. numbers for timestamp columns are epoch milliseconds, truncated
//! 6. raw fragments pass through untouched
//! 7. other structured values are bound as JSON text
//! 8. scalars are bound as text
//!
//! Bound text is always cast to the column's native type, so the server
//! parses it exactly as it would parse a literal of that type.

use serde_json::Value;
use type_mapping::{BindValue, ColumnDescriptor, SqlFragment, SqlValue};

use crate::errors::StoreError;
use crate::ident::{quote_ident, quote_qualified};

pub struct ValueCodec;

impl ValueCodec {
    /// Encode `value` for the column identified as `relation.column`
    pub fn encode(
        column_id: &str,
        descriptor: Option<&ColumnDescriptor>,
        value: &SqlValue,
    ) -> Result<SqlFragment, StoreError> {
        let descriptor = descriptor
            .ok_or_else(|| StoreError::SchemaMissing(format!("{} does not exist", column_id)))?;

        if value.is_null() {
            return Ok(SqlFragment::literal("NULL"));
        }

        if descriptor.is_array {
            match value {
                SqlValue::Json(Value::Array(items)) => return Ok(Self::array(descriptor, items)),
                SqlValue::Raw(_) => {}
                _ => {
                    return Err(StoreError::InvalidValue {
                        column: column_id.to_string(),
                        reason: "expected an array".to_string(),
                    })
                }
            }
        }

        if descriptor.is_geometry() {
            if let SqlValue::Json(geojson @ (Value::Object(_) | Value::Array(_))) = value {
                return Ok(SqlFragment::literal("ST_GeomFromGeoJSON(")
                    .bind(BindValue::Text(Some(geojson.to_string())))
                    .sql(")"));
            }
        }

        if descriptor.is_timestamp() {
            match value {
                SqlValue::Timestamp(dt) => {
                    return Ok(Self::cast(
                        BindValue::Timestamp(*dt),
                        &native_type_sql(descriptor),
                    ));
                }
                SqlValue::Json(v) => {
                    if let Some(millis) = epoch_millis(v) {
                        return Ok(SqlFragment::literal("TO_TIMESTAMP(CAST(")
                            .bind(BindValue::BigInt(millis))
                            .sql(" AS BIGINT) / 1000)"));
                    }
                }
                _ => {}
            }
        }

        let native = &native_type_sql(descriptor);
        let fragment = match value {
            SqlValue::Raw(fragment) => fragment.clone(),
            SqlValue::Json(structured @ (Value::Object(_) | Value::Array(_))) => {
                Self::cast(BindValue::Text(Some(structured.to_string())), native)
            }
            SqlValue::Json(scalar) => Self::cast(
                BindValue::Text(Some(scalar_text(scalar, descriptor.is_json()))),
                native,
            ),
            SqlValue::Timestamp(dt) => Self::cast(BindValue::Timestamp(*dt), native),
            SqlValue::Null => SqlFragment::literal("NULL"),
        };
        Ok(fragment)
    }

    fn cast(value: BindValue, cast_type: &str) -> SqlFragment {
        SqlFragment::literal("CAST(")
            .bind(value)
            .sql(format!(" AS {})", cast_type))
    }

    fn array(descriptor: &ColumnDescriptor, items: &[Value]) -> SqlFragment {
        let json = descriptor.is_json();
        let elements: Vec<Option<String>> = items
            .iter()
            .map(|item| match item {
                Value::Null => None,
                other => Some(scalar_text(other, json)),
            })
            .collect();

        SqlFragment::literal("CAST(")
            .bind(BindValue::TextArray(elements))
            .sql(format!(" AS {}[])", native_type_sql(descriptor)))
    }
}

/// Quoted cast target, schema-qualified for types outside `pg_catalog`
fn native_type_sql(descriptor: &ColumnDescriptor) -> String {
    match &descriptor.type_namespace {
        Some(namespace) => quote_qualified(namespace, &descriptor.native_type),
        None => quote_ident(&descriptor.native_type),
    }
}

/// Text form of a value; JSON columns always receive serialized JSON
fn scalar_text(value: &Value, json: bool) -> String {
    if json {
        return value.to_string();
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Integer interpretation of a value, as epoch milliseconds.
///
/// Fractional milliseconds are truncated.
fn epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate_millis)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate_millis))
        }
        _ => None,
    }
}

fn truncate_millis(n: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up, so the upper bound is exclusive
    (n.is_finite() && n >= i64::MIN as f64 && n < i64::MAX as f64).then(|| n.trunc() as i64)
}
