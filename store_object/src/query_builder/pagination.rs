//! List queries and pages

use serde::{Deserialize, Serialize};

use super::filter::QueryFilter;
use super::ordering::SortOrder;

/// Page size used by `list` when the query does not set one
pub const DEFAULT_LIST_LIMIT: u32 = 10;

/// Page size used by `iterate`
pub const DEFAULT_ITERATE_PAGE_SIZE: u32 = 100;

/// Events buffered between a stream's producer and its consumer
pub const DEFAULT_STREAM_BUFFER: usize = 64;

/// Row limit for a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Rows(u32),
    /// No LIMIT/OFFSET at all; only reachable by asking for it explicitly
    Unbounded,
}

/// Per-mapper defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefaults {
    pub list_limit: u32,
    pub iterate_page_size: u32,
    pub stream_buffer: usize,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_LIST_LIMIT,
            iterate_page_size: DEFAULT_ITERATE_PAGE_SIZE,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

/// Parameters of `list`, `count`, `stream` and `iterate`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub limit: Option<Limit>,
    pub page: u32,
    pub sort: Option<String>,
    pub order: SortOrder,
    pub filter: Option<QueryFilter>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(Limit::Rows(limit));
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.limit = Some(Limit::Unbounded);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn sort(mut self, column: &str) -> Self {
        self.sort = Some(column.to_string());
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// `(limit, offset)` after applying the default limit
    pub fn window(&self, default_limit: u32) -> Option<(i64, i64)> {
        match self.limit.unwrap_or(Limit::Rows(default_limit)) {
            Limit::Rows(limit) => {
                let limit = i64::from(limit);
                Some((limit, limit * i64::from(self.page)))
            }
            Limit::Unbounded => None,
        }
    }
}

/// One page of a list query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows matching the filter, ignoring limit and page
    pub total: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            total: 0,
            items: Vec::new(),
        }
    }
}
