//! Column descriptors
//!
//! A [`ColumnDescriptor`] is the per-column output of schema introspection. It
//! carries the abstract type, nullability and the native type name needed to
//! cast bound parameters back to the column's real type.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Portable classification of a column type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbstractType {
    String,
    Number,
    Boolean,
    Object,
    /// Array column; the element is `None` when its native type is unmapped
    Array(Option<Box<AbstractType>>),
}

impl AbstractType {
    /// JSON-Schema `type` keyword for this kind
    pub fn json_kind(&self) -> &'static str {
        match self {
            AbstractType::String => "string",
            AbstractType::Number => "number",
            AbstractType::Boolean => "boolean",
            AbstractType::Object => "object",
            AbstractType::Array(_) => "array",
        }
    }
}

/// Special handling markers attached to some native types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticTag {
    Timestamp,
    Geometry,
    Uuid,
    Date,
    Time,
    /// Array column holding elements of the named native type
    ArrayOf(String),
}

impl SemanticTag {
    /// JSON-Schema `format` keyword, where one applies
    pub fn json_format(&self) -> Option<&'static str> {
        match self {
            SemanticTag::Timestamp => Some("date-time"),
            SemanticTag::Uuid => Some("uuid"),
            SemanticTag::Date => Some("date"),
            SemanticTag::Time => Some("time"),
            SemanticTag::Geometry | SemanticTag::ArrayOf(_) => None,
        }
    }
}

impl fmt::Display for SemanticTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticTag::Timestamp => write!(f, "timestamp"),
            SemanticTag::Geometry => write!(f, "geometry"),
            SemanticTag::Uuid => write!(f, "uuid"),
            SemanticTag::Date => write!(f, "date"),
            SemanticTag::Time => write!(f, "time"),
            SemanticTag::ArrayOf(element) => write!(f, "{}[]", element),
        }
    }
}

/// Description of one relation column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// `None` for native types the catalog does not know
    pub abstract_type: Option<AbstractType>,
    pub nullable: bool,
    pub length_limit: Option<u32>,
    pub semantic_tag: Option<SemanticTag>,
    pub description: String,
    /// `pg_type.typname` of the column, or of the element for arrays
    pub native_type: String,
    pub is_array: bool,
    /// Semantic tag of the element type for array columns
    pub element_tag: Option<SemanticTag>,
    /// Schema of the native type when it is not a `pg_catalog` builtin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_namespace: Option<String>,
}

impl ColumnDescriptor {
    pub fn is_timestamp(&self) -> bool {
        matches!(self.semantic_tag, Some(SemanticTag::Timestamp))
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self.semantic_tag, Some(SemanticTag::Geometry))
    }

    /// True when the column, or its array element, stores JSON documents
    pub fn is_json(&self) -> bool {
        crate::catalog::TypeCatalog::is_json_type(&self.native_type)
    }

    /// `$comment` text: the native type name, suffixed with `[]` for arrays
    pub fn native_comment(&self) -> String {
        if self.is_array {
            format!("{}[]", self.native_type)
        } else {
            self.native_type.clone()
        }
    }

    /// Render the column as a JSON-Schema fragment
    pub fn to_json_schema(&self) -> Value {
        let mut fragment = Map::new();

        match &self.abstract_type {
            Some(AbstractType::Array(element)) => {
                fragment.insert("type".to_string(), self.nullable_kind("array"));
                let mut items = Map::new();
                if let Some(element) = element {
                    items.insert("type".to_string(), json!(element.json_kind()));
                    if let Some(format) = self.element_tag.as_ref().and_then(SemanticTag::json_format) {
                        items.insert("format".to_string(), json!(format));
                    }
                    if let Some(limit) = self.length_limit {
                        items.insert("maxLength".to_string(), json!(limit));
                    }
                }
                fragment.insert("items".to_string(), Value::Object(items));
            }
            Some(kind) => {
                fragment.insert("type".to_string(), self.nullable_kind(kind.json_kind()));
                if let Some(format) = self.semantic_tag.as_ref().and_then(SemanticTag::json_format) {
                    fragment.insert("format".to_string(), json!(format));
                }
                if let Some(limit) = self.length_limit {
                    fragment.insert("maxLength".to_string(), json!(limit));
                }
            }
            None => {}
        }

        fragment.insert("description".to_string(), json!(self.description));
        fragment.insert("$comment".to_string(), json!(self.native_comment()));
        Value::Object(fragment)
    }

    fn nullable_kind(&self, kind: &str) -> Value {
        if self.nullable {
            json!([kind, "null"])
        } else {
            json!(kind)
        }
    }
}
