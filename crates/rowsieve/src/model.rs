//! Row sources behind a table.
//!
//! A [`ListModel`] hands rows to a table. [`InMemoryModel`] wraps rows that
//! are already in memory; the table filters, sorts and pages them itself.
//! [`QueryModel`] wraps a [`RowSource`] and delegates all three by sending a
//! [`SourceQuery`] built from the table's state.

use tracing::debug;

use crate::error::Result;
use crate::expr::Expr;
use crate::ordering::{Dir, OrderBy};
use crate::path::PropertyPath;
use crate::table::TableState;

/// Where filtering, sorting and paging run for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// In the table, over fetched rows.
    Local,
    /// In the row source.
    PushedDown,
}

/// A collection of rows a table reads from.
pub trait ListModel {
    type Row;

    /// Returns every row of the model, unfiltered.
    fn fetch(&self) -> Result<Vec<Self::Row>>;

    /// Number of rows [`fetch`](Self::fetch) would return.
    fn row_count(&self) -> Result<usize> {
        self.fetch().map(|rows| rows.len())
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Local
    }
}

/// Rows held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryModel<R> {
    rows: Vec<R>,
}

impl<R> InMemoryModel<R> {
    pub fn new(rows: Vec<R>) -> Self {
        InMemoryModel { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R> From<Vec<R>> for InMemoryModel<R> {
    fn from(rows: Vec<R>) -> Self {
        InMemoryModel::new(rows)
    }
}

impl<R> FromIterator<R> for InMemoryModel<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        InMemoryModel::new(iter.into_iter().collect())
    }
}

impl<R: Clone> ListModel for InMemoryModel<R> {
    type Row = R;

    fn fetch(&self) -> Result<Vec<R>> {
        Ok(self.rows.clone())
    }

    fn row_count(&self) -> Result<usize> {
        Ok(self.rows.len())
    }
}

/// A query sent to a [`RowSource`].
///
/// An empty order list means "no ordering"; sources should clear any
/// default ordering they would otherwise apply.
///
/// ```
/// use rowsieve::{Dir, Expr, SourceQuery};
///
/// let query = SourceQuery::new()
///     .filter(Expr::equals("status", "open"))
///     .order_by("created", Dir::Desc)
///     .offset(20)
///     .limit(10);
///
/// assert_eq!(query.get_offset(), Some(20));
/// assert_eq!(query.orderings().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceQuery {
    filter: Option<Expr>,
    orderings: Vec<OrderBy>,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl SourceQuery {
    /// Creates an unfiltered, unordered, unpaged query.
    pub fn new() -> Self {
        SourceQuery::default()
    }

    /// Sets the filter expression. `True` clears it.
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = if expr.is_true() { None } else { Some(expr) };
        self
    }

    /// Appends an ordering clause.
    pub fn order_by(mut self, path: impl Into<PropertyPath>, dir: Dir) -> Self {
        self.orderings.push(OrderBy::new(path, dir));
        self
    }

    /// Replaces all ordering clauses.
    pub fn orderings_from(mut self, orderings: Vec<OrderBy>) -> Self {
        self.orderings = orderings;
        self
    }

    /// Skips the first `n` rows.
    pub fn offset(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }

    /// Returns at most `n` rows.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn get_filter(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }

    pub fn orderings(&self) -> &[OrderBy] {
        &self.orderings
    }

    pub fn get_offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }
}

/// A backend that runs filtered, ordered, paged queries.
///
/// Errors are returned as [`SieveError::Source`](crate::SieveError::Source)
/// (see [`SieveError::from_source`](crate::SieveError::from_source)) and
/// reach the caller unchanged.
pub trait RowSource {
    type Row;

    /// Runs `query` and returns the matching rows.
    fn fetch(&self, query: &SourceQuery) -> Result<Vec<Self::Row>>;

    /// Counts the rows matching `filter`.
    fn count(&self, filter: Option<&Expr>) -> Result<usize>;
}

/// A model that delegates filtering, sorting and paging to a [`RowSource`].
#[derive(Debug, Clone)]
pub struct QueryModel<S> {
    source: S,
}

impl<S: RowSource> QueryModel<S> {
    pub fn new(source: S) -> Self {
        QueryModel { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Builds the query for `state`.
    ///
    /// With `page` set and paging enabled, the query covers that page only.
    pub fn query(&self, state: &TableState, page: Option<usize>) -> SourceQuery {
        let mut query = SourceQuery::new().orderings_from(state.orderings());
        if let Some(expr) = state.compiled_filter() {
            query = query.filter(expr);
        }
        if let (Some(page), Some(size)) = (page, state.page_size()) {
            query = query.offset(page.saturating_sub(1) * size).limit(size);
        }
        query
    }

    /// Fetches the rows of `state`, or of one page of it.
    pub fn fetch(&self, state: &TableState, page: Option<usize>) -> Result<Vec<S::Row>> {
        let query = self.query(state, page);
        debug!(
            table = %state.id(),
            filter = ?query.get_filter().map(ToString::to_string),
            offset = ?query.get_offset(),
            limit = ?query.get_limit(),
            "fetching rows from source"
        );
        self.source.fetch(&query)
    }

    /// Counts the rows of `state`, ignoring sort and paging.
    pub fn row_count(&self, state: &TableState) -> Result<usize> {
        let filter = state.compiled_filter();
        debug!(table = %state.id(), "counting rows at source");
        self.source.count(filter.as_ref())
    }
}

impl<S: RowSource> ListModel for QueryModel<S> {
    type Row = S::Row;

    fn fetch(&self) -> Result<Vec<S::Row>> {
        self.source.fetch(&SourceQuery::new())
    }

    fn row_count(&self) -> Result<usize> {
        self.source.count(None)
    }

    fn kind(&self) -> ModelKind {
        ModelKind::PushedDown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, Mode};
    use std::cell::RefCell;

    #[test]
    fn in_memory_model_returns_rows_verbatim() {
        let model: InMemoryModel<u8> = vec![3, 1, 2].into();
        assert_eq!(model.fetch().unwrap(), vec![3, 1, 2]);
        assert_eq!(ListModel::row_count(&model).unwrap(), 3);
        assert_eq!(model.kind(), ModelKind::Local);
    }

    #[test]
    fn true_filter_is_dropped() {
        let query = SourceQuery::new().filter(Expr::True);
        assert_eq!(query.get_filter(), None);
    }

    #[derive(Default)]
    struct Recorder {
        queries: RefCell<Vec<SourceQuery>>,
    }

    impl RowSource for Recorder {
        type Row = u32;

        fn fetch(&self, query: &SourceQuery) -> Result<Vec<u32>> {
            self.queries.borrow_mut().push(query.clone());
            Ok(Vec::new())
        }

        fn count(&self, _filter: Option<&Expr>) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn query_reflects_table_state() {
        let model = QueryModel::new(Recorder::default());
        let mut state = TableState::new();
        state.set_entries_per_page(5);
        state.set_sort_by("name", Some(Dir::Desc));
        state.set_filter("f", Filter::exact(Mode::Any, ["status"], "open"));

        let query = model.query(&state, Some(3));
        assert_eq!(query.get_offset(), Some(10));
        assert_eq!(query.get_limit(), Some(5));
        assert_eq!(query.orderings(), &[OrderBy::desc("name")]);
        assert_eq!(query.get_filter(), Some(&Expr::equals("status", "open")));

        let unpaged = model.query(&state, None);
        assert_eq!(unpaged.get_offset(), None);
        assert_eq!(unpaged.get_limit(), None);
    }

    #[test]
    fn unset_sort_sends_empty_order_list() {
        let model = QueryModel::new(Recorder::default());
        let state = TableState::new();
        model.fetch(&state, Some(1)).unwrap();
        let sent = model.source().queries.borrow();
        assert!(sent[0].orderings().is_empty());
        assert_eq!(sent[0].get_filter(), None);
    }

    #[test]
    fn paging_disabled_ignores_page() {
        let model = QueryModel::new(Recorder::default());
        let mut state = TableState::new();
        state.set_paging_enabled(false);
        let query = model.query(&state, Some(2));
        assert_eq!(query.get_limit(), None);
        assert_eq!(model.kind(), ModelKind::PushedDown);
    }
}
