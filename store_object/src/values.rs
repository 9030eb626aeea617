//! Column values for inserts and patches

use serde::Serialize;
use serde_json::{Map, Value};
use type_mapping::SqlValue;

use crate::errors::StoreError;

/// Ordered column → value mapping used by `generate` and `commit`.
///
/// A column is either set (possibly to NULL) or absent. Absent columns are
/// left to their defaults on insert and untouched on update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: Vec<(String, SqlValue)>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing any earlier value for it
    pub fn set(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column only when `value` is present
    pub fn set_opt<V: Into<SqlValue>>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(column, value),
            None => self,
        }
    }

    pub fn insert(&mut self, column: &str, value: impl Into<SqlValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column.to_string(), value)),
        }
    }

    pub fn remove(&mut self, column: &str) -> Option<SqlValue> {
        let position = self.entries.iter().position(|(name, _)| name == column)?;
        Some(self.entries.remove(position).1)
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build from a JSON object; every key, including null ones, is set
    pub fn from_json(value: Value) -> Result<Self, StoreError> {
        match value {
            Value::Object(map) => Ok(Self::from(map)),
            other => Err(StoreError::InvalidValue {
                column: "*".to_string(),
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }

    /// Build from any serializable struct or map
    pub fn from_serialize<S: Serialize>(value: &S) -> Result<Self, StoreError> {
        Self::from_json(serde_json::to_value(value)?)
    }
}

impl From<Map<String, Value>> for Values {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(column, value)| (column, SqlValue::Json(value)))
                .collect(),
        }
    }
}

impl FromIterator<(String, SqlValue)> for Values {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (column, value) in iter {
            values.insert(&column, value);
        }
        values
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
