//! Schema introspection and the cached relation catalog

pub mod introspector;
pub mod relation;

pub use introspector::{CatalogColumn, CatalogKey, CatalogReader, SchemaIntrospector, SPATIAL_REF_SYS};
pub use relation::{RelationKind, RelationSchema, SchemaCatalog};
