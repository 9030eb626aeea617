//! Convenience re-exports for common pg-generic usage
//!
//! # Example
//!
//! ```rust
//! use pg_generic::prelude::*;
//!
//! let query = ListQuery::new().limit(5).order(SortOrder::Desc);
//! assert_eq!(query.window(10), Some((5, 0)));
//! ```

// Core components
pub use crate::core::PgGeneric;
pub use crate::errors::PgGenericError;
pub use crate::params::{ListParams, ParamError, Params};

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, QueryConfig, SchemaConfig};

// Mapper types, values and predicates
pub use store_object::prelude::*;

// Common external dependencies
pub use sqlx;
pub use tokio;
