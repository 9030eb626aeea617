//! # pg-generic
//!
//! Generic row mapping for PostgreSQL. The live catalog is introspected into
//! a schema; mappers bound to a table or view then offer list, count, get,
//! insert, update, delete, stream and iterate for any deserializable entity
//! type, with every value bound as a parameter cast to its column's type.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pg_generic::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! struct Dog {
//!     id: i64,
//!     name: String,
//!     species: Option<String>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let db = PgGeneric::connect(&config).await?;
//!
//!     let dogs = db.table::<Dog>("dog")?;
//!     let created = dogs
//!         .generate(Values::new().set("name", "prairie").set("species", "mutt"))
//!         .await?;
//!
//!     let renamed = dogs
//!         .commit(created.id, Values::new().set("name", "ozzy"))
//!         .await?;
//!     println!("{} is now {}", created.name, renamed.name);
//!
//!     let page = dogs
//!         .list(ListQuery::new().sort("name").order(SortOrder::Desc))
//!         .await?;
//!     println!("{} dogs, first page has {}", page.total, page.items.len());
//!
//!     dogs.delete(created.id).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod errors;
pub mod params;
pub mod prelude;
pub mod schema_files;

// Re-export the main public types for convenience
pub use crate::core::{PgGeneric, connect_pool};
pub use errors::PgGenericError;
pub use params::{ListParams, ParamError, Params};

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, QueryConfig, SchemaConfig};

// Re-export internal crates used in the public API
pub use store_object;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use sqlx;
