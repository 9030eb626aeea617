//! Native PostgreSQL type names to abstract descriptors
//!
//! The catalog is a static table keyed by the names PostgreSQL reports for a
//! column's base type, both the SQL-standard spelling returned by
//! `format_type` ("character varying", "timestamp with time zone") and the
//! internal `pg_type.typname` spelling ("varchar", "timestamptz").

use std::collections::HashMap;

use crate::descriptor::{AbstractType, SemanticTag};

/// Abstract classification of a native type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub abstract_type: AbstractType,
    pub semantic_tag: Option<SemanticTag>,
}

impl TypeDescriptor {
    const fn plain(abstract_type: AbstractType) -> Self {
        Self {
            abstract_type,
            semantic_tag: None,
        }
    }

    const fn tagged(abstract_type: AbstractType, tag: SemanticTag) -> Self {
        Self {
            abstract_type,
            semantic_tag: Some(tag),
        }
    }
}

const CHARACTER_TYPES: &[&str] = &[
    "bit",
    "bit varying",
    "varbit",
    "character",
    "bpchar",
    "char",
    "character varying",
    "varchar",
    "text",
    "citext",
    "name",
];

const NUMERIC_TYPES: &[&str] = &[
    "bigint",
    "int8",
    "decimal",
    "double precision",
    "float8",
    "int",
    "integer",
    "int4",
    "numeric",
    "real",
    "float4",
    "smallint",
    "int2",
    "money",
    "oid",
];

const BOOLEAN_TYPES: &[&str] = &["boolean", "bool"];

const JSON_TYPES: &[&str] = &["json", "jsonb"];

const TIMESTAMP_TYPES: &[&str] = &[
    "timestamp",
    "timestamp without time zone",
    "timestamp with time zone",
    "timestamptz",
];

const TIME_TYPES: &[&str] = &[
    "time",
    "time without time zone",
    "time with time zone",
    "timetz",
];

const GEOMETRY_TYPES: &[&str] = &["geometry", "geography"];

/// Maps native column type names to [`TypeDescriptor`]s
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    entries: HashMap<&'static str, TypeDescriptor>,
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCatalog {
    pub fn new() -> Self {
        let mut entries = HashMap::new();

        let mut register = |names: &[&'static str], descriptor: TypeDescriptor| {
            for name in names {
                entries.insert(*name, descriptor.clone());
            }
        };

        register(CHARACTER_TYPES, TypeDescriptor::plain(AbstractType::String));
        register(NUMERIC_TYPES, TypeDescriptor::plain(AbstractType::Number));
        register(BOOLEAN_TYPES, TypeDescriptor::plain(AbstractType::Boolean));
        register(JSON_TYPES, TypeDescriptor::plain(AbstractType::Object));
        register(
            TIMESTAMP_TYPES,
            TypeDescriptor::tagged(AbstractType::String, SemanticTag::Timestamp),
        );
        register(
            TIME_TYPES,
            TypeDescriptor::tagged(AbstractType::String, SemanticTag::Time),
        );
        register(
            &["date"],
            TypeDescriptor::tagged(AbstractType::String, SemanticTag::Date),
        );
        register(
            &["uuid"],
            TypeDescriptor::tagged(AbstractType::String, SemanticTag::Uuid),
        );
        // Intervals are exchanged as a number of units, never as text
        register(&["interval"], TypeDescriptor::plain(AbstractType::Number));
        register(
            GEOMETRY_TYPES,
            TypeDescriptor::tagged(AbstractType::Object, SemanticTag::Geometry),
        );

        Self { entries }
    }

    /// Look up a native type name. Unknown names yield `None` and callers
    /// treat the column as opaque.
    pub fn descriptor_for(&self, native_type: &str) -> Option<TypeDescriptor> {
        let normalized = native_type.trim().to_ascii_lowercase();
        self.entries.get(normalized.as_str()).cloned()
    }

    /// True when the native type stores JSON documents
    pub fn is_json_type(native_type: &str) -> bool {
        JSON_TYPES.contains(&native_type.trim().to_ascii_lowercase().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_family_maps_to_string() {
        let catalog = TypeCatalog::new();
        for name in ["text", "character varying", "varchar", "bpchar", "bit varying"] {
            let descriptor = catalog.descriptor_for(name).unwrap();
            assert_eq!(descriptor.abstract_type, AbstractType::String, "{}", name);
            assert!(descriptor.semantic_tag.is_none());
        }
    }

    #[test]
    fn test_numeric_family_maps_to_number() {
        let catalog = TypeCatalog::new();
        for name in ["bigint", "integer", "int4", "double precision", "numeric", "smallint"] {
            assert_eq!(
                catalog.descriptor_for(name).unwrap().abstract_type,
                AbstractType::Number,
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_semantic_tags() {
        let catalog = TypeCatalog::new();
        assert_eq!(
            catalog.descriptor_for("timestamp with time zone").unwrap().semantic_tag,
            Some(SemanticTag::Timestamp)
        );
        assert_eq!(
            catalog.descriptor_for("timestamp").unwrap().semantic_tag,
            Some(SemanticTag::Timestamp)
        );
        assert_eq!(
            catalog.descriptor_for("uuid").unwrap().semantic_tag,
            Some(SemanticTag::Uuid)
        );
        assert_eq!(
            catalog.descriptor_for("geometry").unwrap(),
            TypeDescriptor::tagged(AbstractType::Object, SemanticTag::Geometry)
        );
        assert_eq!(
            catalog.descriptor_for("time without time zone").unwrap().semantic_tag,
            Some(SemanticTag::Time)
        );
    }

    #[test]
    fn test_lookup_is_case_and_whitespace_insensitive() {
        let catalog = TypeCatalog::new();
        assert_eq!(
            catalog.descriptor_for("  JSONB ").unwrap().abstract_type,
            AbstractType::Object
        );
    }

    #[test]
    fn test_unknown_type_is_absent() {
        let catalog = TypeCatalog::new();
        assert!(catalog.descriptor_for("tsvector").is_none());
        assert!(catalog.descriptor_for("").is_none());
    }

    #[test]
    fn test_is_json_type() {
        assert!(TypeCatalog::is_json_type("jsonb"));
        assert!(TypeCatalog::is_json_type("json"));
        assert!(!TypeCatalog::is_json_type("text"));
    }
}
