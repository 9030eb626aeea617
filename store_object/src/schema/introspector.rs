//! Catalog introspection
//!
//! Reads `pg_catalog` for every table and view of a namespace and turns the
//! rows into a [`SchemaCatalog`]. Reading and building are split so the
//! building half can be exercised without a server.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use type_mapping::{AbstractType, ColumnDescriptor, SemanticTag, TypeCatalog};

use super::relation::{RelationKind, RelationSchema, SchemaCatalog};
use crate::errors::StoreError;
use crate::{debug_log, trace_log};

/// Relation excluded by default: PostGIS's spatial reference table
pub const SPATIAL_REF_SYS: &str = "spatial_ref_sys";

const BUILTIN_NAMESPACE: &str = "pg_catalog";

const COLUMNS_SQL: &str = r#"
SELECT
    cls.relname::text AS relation,
    cls.relkind::text AS relkind,
    att.attname::text AS column_name,
    att.attnotnull AS not_null,
    (typ.typcategory = 'A') AS is_array,
    COALESCE(elem.typname, typ.typname)::text AS udt_name,
    tns.nspname::text AS type_namespace,
    format_type(COALESCE(elem.oid, typ.oid), -1) AS type_name,
    CASE
        WHEN COALESCE(elem.typname, typ.typname) IN ('varchar', 'bpchar') AND att.atttypmod > 4
            THEN att.atttypmod - 4
    END AS max_length,
    col_description(cls.oid, att.attnum) AS description
FROM pg_catalog.pg_attribute att
JOIN pg_catalog.pg_class cls ON cls.oid = att.attrelid
JOIN pg_catalog.pg_namespace ns ON ns.oid = cls.relnamespace
JOIN pg_catalog.pg_type typ ON typ.oid = att.atttypid
LEFT JOIN pg_catalog.pg_type elem ON typ.typcategory = 'A' AND elem.oid = typ.typelem
JOIN pg_catalog.pg_namespace tns ON tns.oid = COALESCE(elem.typnamespace, typ.typnamespace)
WHERE ns.nspname = $1
  AND cls.relkind IN ('r', 'p', 'f', 'v', 'm')
  AND att.attnum > 0
  AND NOT att.attisdropped
ORDER BY cls.relname, att.attnum
"#;

const PRIMARY_KEYS_SQL: &str = r#"
SELECT
    cls.relname::text AS relation,
    att.attname::text AS column_name
FROM pg_catalog.pg_index idx
JOIN pg_catalog.pg_class cls ON cls.oid = idx.indrelid
JOIN pg_catalog.pg_namespace ns ON ns.oid = cls.relnamespace
JOIN pg_catalog.pg_attribute att ON att.attrelid = cls.oid AND att.attnum = ANY(idx.indkey)
WHERE idx.indisprimary
  AND ns.nspname = $1
ORDER BY cls.relname, att.attnum
"#;

/// One column row read from the catalog
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CatalogColumn {
    pub relation: String,
    pub relkind: String,
    pub column_name: String,
    pub not_null: bool,
    pub is_array: bool,
    pub udt_name: String,
    pub type_namespace: String,
    pub type_name: String,
    pub max_length: Option<i32>,
    pub description: Option<String>,
}

/// One primary-key column read from the catalog
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CatalogKey {
    pub relation: String,
    pub column_name: String,
}

/// Source of catalog rows
#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn columns(&self, namespace: &str) -> Result<Vec<CatalogColumn>, sqlx::Error>;
    async fn primary_keys(&self, namespace: &str) -> Result<Vec<CatalogKey>, sqlx::Error>;
}

#[async_trait]
impl CatalogReader for PgPool {
    async fn columns(&self, namespace: &str) -> Result<Vec<CatalogColumn>, sqlx::Error> {
        sqlx::query_as::<_, CatalogColumn>(COLUMNS_SQL)
            .bind(namespace)
            .fetch_all(self)
            .await
    }

    async fn primary_keys(&self, namespace: &str) -> Result<Vec<CatalogKey>, sqlx::Error> {
        sqlx::query_as::<_, CatalogKey>(PRIMARY_KEYS_SQL)
            .bind(namespace)
            .fetch_all(self)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct SchemaIntrospector {
    namespace: String,
    excluded: Vec<String>,
    types: TypeCatalog,
}

impl Default for SchemaIntrospector {
    fn default() -> Self {
        Self::new("public")
    }
}

impl SchemaIntrospector {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            excluded: vec![SPATIAL_REF_SYS.to_string()],
            types: TypeCatalog::new(),
        }
    }

    /// Replace the list of relations to skip
    pub fn with_excluded(mut self, excluded: Vec<String>) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Read the catalog and build the schema
    pub async fn introspect<R>(&self, reader: &R) -> Result<SchemaCatalog, StoreError>
    where
        R: CatalogReader + ?Sized,
    {
        let columns = reader
            .columns(&self.namespace)
            .await
            .map_err(|e| StoreError::database_operation(&self.namespace, "introspect", e))?;
        let keys = reader
            .primary_keys(&self.namespace)
            .await
            .map_err(|e| StoreError::database_operation(&self.namespace, "introspect", e))?;

        debug_log!(
            "[INTROSPECT] namespace={} columns={} key_columns={}",
            self.namespace,
            columns.len(),
            keys.len()
        );

        Ok(self.build(columns, keys))
    }

    /// Build a catalog from rows already read
    pub fn build(&self, columns: Vec<CatalogColumn>, keys: Vec<CatalogKey>) -> SchemaCatalog {
        let mut relations: BTreeMap<String, RelationSchema> = BTreeMap::new();

        for column in columns {
            if self.excluded.iter().any(|name| *name == column.relation) {
                continue;
            }
            let Some(kind) = relation_kind(&column.relkind) else {
                trace_log!("[INTROSPECT] skipping relkind {}", column.relkind);
                continue;
            };

            let descriptor = self.describe(&column);
            relations
                .entry(column.relation.clone())
                .or_insert_with(|| RelationSchema::new(kind, &self.namespace, &column.relation))
                .push_column(descriptor);
        }

        let mut key_columns: HashMap<String, Vec<String>> = HashMap::new();
        for key in keys {
            key_columns.entry(key.relation).or_default().push(key.column_name);
        }

        let mut catalog = SchemaCatalog::new();
        for (name, mut relation) in relations {
            // Composite keys cannot serve as a single key column
            if let Some([column]) = key_columns.get(&name).map(Vec::as_slice) {
                relation.primary_key = Some(column.clone());
            }
            catalog.insert(relation);
        }
        catalog
    }

    fn describe(&self, column: &CatalogColumn) -> ColumnDescriptor {
        let base = self
            .types
            .descriptor_for(&column.type_name)
            .or_else(|| self.types.descriptor_for(&column.udt_name));

        let (abstract_type, semantic_tag, element_tag) = if column.is_array {
            let element = base.as_ref().map(|b| Box::new(b.abstract_type.clone()));
            (
                Some(AbstractType::Array(element)),
                Some(SemanticTag::ArrayOf(column.udt_name.clone())),
                base.and_then(|b| b.semantic_tag),
            )
        } else {
            match base {
                Some(b) => (Some(b.abstract_type), b.semantic_tag, None),
                None => (None, None, None),
            }
        };

        ColumnDescriptor {
            name: column.column_name.clone(),
            abstract_type,
            nullable: !column.not_null,
            length_limit: column.max_length.and_then(|l| u32::try_from(l).ok()),
            semantic_tag,
            description: column.description.clone().unwrap_or_default(),
            native_type: column.udt_name.clone(),
            is_array: column.is_array,
            element_tag,
            type_namespace: (column.type_namespace != BUILTIN_NAMESPACE)
                .then(|| column.type_namespace.clone()),
        }
    }
}

fn relation_kind(relkind: &str) -> Option<RelationKind> {
    match relkind {
        "r" | "p" | "f" => Some(RelationKind::Table),
        "v" | "m" => Some(RelationKind::View),
        _ => None,
    }
}
