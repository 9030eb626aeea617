//! Type mapping between PostgreSQL catalog types and portable descriptors
//!
//! This crate holds the leaf pieces of the data-access layer: the static
//! [`TypeCatalog`], per-column [`ColumnDescriptor`]s, the [`SqlValue`] runtime
//! value model and parameterized [`SqlFragment`]s.

pub mod catalog;
pub mod descriptor;
pub mod fragment;
pub mod types;

pub use catalog::{TypeCatalog, TypeDescriptor};
pub use descriptor::{AbstractType, ColumnDescriptor, SemanticTag};
pub use fragment::{FragmentError, FragmentPart, SqlFragment};
pub use types::{BindValue, SqlValue};
