//! Tables that push filtering, sorting and paging down to a row source.

use crate::cache::RequestCache;
use crate::config::TableConfig;
use crate::error::Result;
use crate::model::{QueryModel, RowSource};
use crate::table::{Table, TableState};

/// A table over a [`QueryModel`].
///
/// Every row read sends a query to the source; only the row count is cached
/// per request. [`rows`](Table::rows) materializes the whole filtered set
/// and is meant for exports and similar, while
/// [`page_rows`](Table::page_rows) asks for a single page.
///
/// Filters and sort must be settled before the first read of a request:
/// the count is not re-queried when a sort changes, and rows read before and
/// after a change come from different queries.
pub struct PushedDownTable<S> {
    model: QueryModel<S>,
    state: TableState,
}

impl<S> PushedDownTable<S>
where
    S: RowSource,
    S::Row: 'static,
{
    pub fn new(source: S) -> Self {
        PushedDownTable::with_model(QueryModel::new(source))
    }

    pub fn with_model(model: QueryModel<S>) -> Self {
        PushedDownTable {
            model,
            state: TableState::new(),
        }
    }

    /// Creates a table with state read from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured filter does not build.
    pub fn with_config(source: S, config: &TableConfig) -> Result<Self> {
        Ok(PushedDownTable {
            model: QueryModel::new(source),
            state: TableState::from_config(config)?,
        })
    }

    pub fn model(&self) -> &QueryModel<S> {
        &self.model
    }

    /// Replaces the model, returning the old one. Cached counts of this
    /// table are discarded in every request cache.
    pub fn set_model(&mut self, model: QueryModel<S>) -> QueryModel<S> {
        self.state.model_replaced();
        std::mem::replace(&mut self.model, model)
    }
}

impl<S> Table for PushedDownTable<S>
where
    S: RowSource,
    S::Row: 'static,
{
    type Row = S::Row;
    type Rows<'c>
        = Vec<S::Row>
    where
        Self: 'c;

    fn state(&self) -> &TableState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut TableState {
        &mut self.state
    }

    fn rows<'c>(&'c self, _cache: &'c mut RequestCache) -> Result<Vec<S::Row>> {
        self.model.fetch(&self.state, None)
    }

    fn page_rows<'c>(&'c self, cache: &'c mut RequestCache) -> Result<Vec<S::Row>> {
        if !self.state.paging_enabled() {
            return self.rows(cache);
        }
        let page = self.current_page(cache)?;
        self.model.fetch(&self.state, Some(page))
    }

    fn row_count(&self, cache: &mut RequestCache) -> Result<usize> {
        let entry = cache.entry::<S::Row>(self.state.id(), self.state.revisions());
        if let Some(count) = entry.row_count {
            return Ok(count);
        }
        let count = self.model.row_count(&self.state)?;
        entry.row_count = Some(count);
        Ok(count)
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for PushedDownTable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushedDownTable")
            .field("model", &self.model)
            .field("state", &self.state)
            .finish()
    }
}
