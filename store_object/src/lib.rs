//! Store Object - generic row mapping for Postgres
//!
//! This crate introspects relations into a [`SchemaCatalog`], encodes values
//! against column descriptors, builds parameterized statements and exposes
//! [`GenericStore`], a mapper usable with any deserializable entity type.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        ::tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod codec;
pub mod errors;
pub mod generic_store;
pub mod id_type;
pub mod ident;
pub mod prelude;
pub mod query_builder;
pub mod schema;
pub mod traits;
pub mod values;

pub use codec::ValueCodec;
pub use errors::StoreError;
pub use generic_store::{EntityIter, GenericStore, Row, RowStream, StreamEvent};
pub use id_type::{Selector, UniversalId};
pub use ident::{quote_ident, quote_qualified, validate_ident, IdentError};
pub use query_builder::{
    ConflictAction, Limit, ListQuery, Page, QueryDefaults, QueryFilter, QueryOperator, SortOrder,
    SqlGenerator, Upsert,
};
pub use schema::{CatalogReader, RelationKind, RelationSchema, SchemaCatalog, SchemaIntrospector};
pub use traits::*;
pub use values::Values;

use sqlx::PgPool;

pub type DbPool = PgPool;
