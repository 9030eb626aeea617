//! Convenience re-exports for common store-object usage

// Mappers and markers
pub use crate::generic_store::{EntityIter, GenericStore, Row, RowStream, StreamEvent};
pub use crate::traits::{Backing, Entity, Table, View};

// Error types
pub use crate::errors::StoreError;

// Keys, values and predicates
pub use crate::id_type::{Selector, UniversalId};
pub use crate::query_builder::{ListQuery, Page, QueryFilter, SortOrder, Upsert};
pub use crate::values::Values;
pub use type_mapping::{SqlFragment, SqlValue};

// Schema
pub use crate::schema::{RelationSchema, SchemaCatalog, SchemaIntrospector};

// Common external dependencies that are frequently used
pub use serde::{Deserialize, Serialize};
pub use sqlx::PgPool;
pub use uuid::Uuid;
