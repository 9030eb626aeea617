//! Read operations, available to table- and view-backed mappers

use sqlx::Row as _;

use super::core::GenericStore;
use super::iterate::EntityIter;
use super::stream::RowStream;
use crate::debug_log;
use crate::errors::StoreError;
use crate::id_type::Selector;
use crate::query_builder::{ListQuery, Page, SqlGenerator, COUNT_COLUMN};
use crate::traits::{Backing, Entity};

impl<T: Entity, B: Backing> GenericStore<T, B> {
    /// One page of rows plus the total number of matches.
    ///
    /// The total is read from the window count of the first row. An empty
    /// page that may have skipped matches (`limit` 0 or a page past the end)
    /// takes the total from a separate count.
    pub async fn list(&self, query: ListQuery) -> Result<Page<T>, StoreError> {
        if let Some(page) = self.select_page(&query).await? {
            return Ok(page);
        }
        match query.window(self.defaults.list_limit) {
            Some((limit, offset)) if limit == 0 || offset > 0 => Ok(Page {
                total: self.count(query).await?,
                items: Vec::new(),
            }),
            _ => Ok(Page::empty()),
        }
    }

    /// Single round trip behind `list`; `None` when no row came back
    pub(crate) async fn select_page(&self, query: &ListQuery) -> Result<Option<Page<T>>, StoreError> {
        let ordering = self.ordering(query);
        let window = query.window(self.defaults.list_limit);
        let mut qb =
            SqlGenerator::select_list(&self.relation, query.filter.as_ref(), &ordering, window)?;
        debug_log!("[LIST] {}", qb.sql());

        let rows = qb
            .build()
            .fetch_all(&self.db_pool)
            .await
            .map_err(|e| StoreError::database_operation(&self.relation.name, "list", e))?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let total: i64 = first
            .try_get(COUNT_COLUMN)
            .map_err(|e| StoreError::database_operation(&self.relation.name, "list", e))?;

        let items = rows
            .iter()
            .map(|row| self.decode(row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Page { total, items }))
    }

    /// Number of rows matching the query's filter; limit and page are ignored
    pub async fn count(&self, query: ListQuery) -> Result<i64, StoreError> {
        let mut qb = SqlGenerator::select_count(&self.relation, query.filter.as_ref())?;
        debug_log!("[COUNT] {}", qb.sql());

        let row = qb
            .build()
            .fetch_one(&self.db_pool)
            .await
            .map_err(|e| StoreError::database_operation(&self.relation.name, "count", e))?;

        row.try_get(COUNT_COLUMN)
            .map_err(|e| StoreError::database_operation(&self.relation.name, "count", e))
    }

    /// Exactly one row; the first one when a predicate matches several
    pub async fn from(&self, selector: impl Into<Selector>) -> Result<T, StoreError> {
        let filter = self.selector_filter(selector.into())?;
        let mut qb = SqlGenerator::select_one(&self.relation, &filter)?;
        debug_log!("[FROM] {}", qb.sql());

        let row = qb
            .build()
            .fetch_optional(&self.db_pool)
            .await
            .map_err(|e| StoreError::database_operation(&self.relation.name, "from", e))?;

        match row {
            Some(row) => self.decode(&row),
            None => Err(StoreError::not_found(&self.relation.name)),
        }
    }

    /// Push-style sequence of `Count`, `Data`... then `End` or `Error`.
    ///
    /// The query's limit and page are ignored; every matching row is sent.
    pub fn stream(&self, query: ListQuery) -> Result<RowStream<T>, StoreError> {
        let ordering = self.ordering(&query);
        let qb = SqlGenerator::select_list(&self.relation, query.filter.as_ref(), &ordering, None)?;
        debug_log!("[STREAM] {}", qb.sql());

        Ok(RowStream::spawn(self.clone(), qb))
    }

    /// Pull-style iteration over every matching row, one page at a time
    pub fn iterate(&self, query: ListQuery) -> EntityIter<T, B> {
        EntityIter::new(self.clone(), query)
    }
}
