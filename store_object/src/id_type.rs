//! Row identities and selectors
//!
//! [`UniversalId`] holds a key value of any of the common key types.
//! [`Selector`] is what by-key operations accept: a key on the mapper's key
//! column, a key on another column, or an arbitrary predicate.

use std::fmt::{self, Display};
use type_mapping::SqlValue;
use uuid::Uuid;

use crate::query_builder::QueryFilter;

/// Key value that can hold numeric, UUID or text keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UniversalId {
    Numeric(i64),
    Uuid(Uuid),
    String(String),
}

impl Display for UniversalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniversalId::Numeric(n) => write!(f, "{}", n),
            UniversalId::Uuid(uuid) => write!(f, "{}", uuid),
            UniversalId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<UniversalId> for SqlValue {
    fn from(id: UniversalId) -> Self {
        match id {
            UniversalId::Numeric(n) => SqlValue::from(n),
            UniversalId::Uuid(uuid) => SqlValue::from(uuid),
            UniversalId::String(s) => SqlValue::from(s),
        }
    }
}

impl From<i32> for UniversalId {
    fn from(id: i32) -> Self {
        UniversalId::Numeric(id as i64)
    }
}

impl From<i64> for UniversalId {
    fn from(id: i64) -> Self {
        UniversalId::Numeric(id)
    }
}

impl From<u32> for UniversalId {
    fn from(id: u32) -> Self {
        UniversalId::Numeric(id as i64)
    }
}

impl From<Uuid> for UniversalId {
    fn from(id: Uuid) -> Self {
        UniversalId::Uuid(id)
    }
}

impl From<String> for UniversalId {
    fn from(id: String) -> Self {
        UniversalId::String(id)
    }
}

impl From<&str> for UniversalId {
    fn from(id: &str) -> Self {
        UniversalId::String(id.to_string())
    }
}

/// Target of a by-key operation
#[derive(Debug, Clone)]
pub enum Selector {
    /// Match on the mapper's key column
    Key(UniversalId),
    /// Match on a named column
    Column { column: String, id: UniversalId },
    /// Match an arbitrary predicate
    Where(QueryFilter),
}

impl Selector {
    pub fn column(column: &str, id: impl Into<UniversalId>) -> Self {
        Selector::Column {
            column: column.to_string(),
            id: id.into(),
        }
    }
}

impl From<UniversalId> for Selector {
    fn from(id: UniversalId) -> Self {
        Selector::Key(id)
    }
}

impl From<QueryFilter> for Selector {
    fn from(filter: QueryFilter) -> Self {
        Selector::Where(filter)
    }
}

macro_rules! selector_from_key {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Selector {
                fn from(id: $ty) -> Self {
                    Selector::Key(UniversalId::from(id))
                }
            }
        )*
    };
}

selector_from_key!(i32, i64, u32, Uuid, String, &str);
