use futures::Stream;
use std::collections::VecDeque;

use super::core::GenericStore;
use crate::errors::StoreError;
use crate::query_builder::ListQuery;
use crate::trace_log;
use crate::traits::{Backing, Entity};

/// Pull-style iteration built on repeated `list` calls.
///
/// Pages of `iterate_page_size` rows are fetched one at a time, starting at
/// the query's page, until a page comes back empty. The query's own limit
/// is ignored.
pub struct EntityIter<T, B: Backing> {
    store: GenericStore<T, B>,
    query: ListQuery,
    buffer: VecDeque<T>,
    exhausted: bool,
}

impl<T: Entity, B: Backing> EntityIter<T, B> {
    pub(crate) fn new(store: GenericStore<T, B>, query: ListQuery) -> Self {
        let page_size = store.defaults.iterate_page_size.max(1);
        Self {
            store,
            query: query.limit(page_size),
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub async fn next(&mut self) -> Result<Option<T>, StoreError> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fetch_page().await?;
        }
        Ok(self.buffer.pop_front())
    }

    /// Collect every remaining row
    pub async fn collect(mut self) -> Result<Vec<T>, StoreError> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<T, StoreError>> {
        futures::stream::try_unfold(self, |mut iter| async move {
            Ok(iter.next().await?.map(|item| (item, iter)))
        })
    }

    async fn fetch_page(&mut self) -> Result<(), StoreError> {
        let page = self.store.select_page(&self.query).await?;
        trace_log!(
            "[ITERATE] {} page {} returned {} rows",
            self.store.table_name(),
            self.query.page,
            page.as_ref().map_or(0, |p| p.items.len())
        );

        match page {
            Some(page) => {
                self.buffer.extend(page.items);
                self.query.page += 1;
            }
            None => self.exhausted = true,
        }
        Ok(())
    }
}
