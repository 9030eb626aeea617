//! Trait definitions
//!
//! [`Backing`] separates table-backed mappers from view-backed ones at the
//! type level. Write operations are only implemented for [`Table`].

use serde::de::DeserializeOwned;

use crate::schema::RelationKind;

/// Row type a mapper decodes into
pub trait Entity: DeserializeOwned + Send + 'static {}

impl<T> Entity for T where T: DeserializeOwned + Send + 'static {}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Table {}
    impl Sealed for super::View {}
}

/// Kind of relation a mapper is bound to
pub trait Backing: sealed::Sealed + Send + Sync + 'static {
    const KIND: RelationKind;
}

/// Marker for table-backed mappers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table;

/// Marker for view-backed mappers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View;

impl Backing for Table {
    const KIND: RelationKind = RelationKind::Table;
}

impl Backing for View {
    const KIND: RelationKind = RelationKind::View;
}
