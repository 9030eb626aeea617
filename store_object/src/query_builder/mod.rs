//! Query builder utilities
//!
//! Predicates, ordering, paging and the statement generator.

pub mod filter;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;


pub use filter::{LogicalOperator, Operand, QueryCondition, QueryFilter, QueryOperator};
pub use ordering::{InvalidSortOrder, SortOrder};
pub use pagination::{
    Limit, ListQuery, Page, QueryDefaults, DEFAULT_ITERATE_PAGE_SIZE, DEFAULT_LIST_LIMIT,
    DEFAULT_STREAM_BUFFER,
};
pub use sql_generation::{
    ConflictAction, SqlGenerator, Upsert, COUNT_COLUMN, ROW_ALIAS, ROW_COLUMN,
};
