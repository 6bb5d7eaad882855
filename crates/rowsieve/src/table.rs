//! Table state and the shared table interface.
//!
//! A table combines a model with filters, a sort and page state. It is a
//! long-lived value (one per view, say) that is configured through `&mut`
//! methods and read many times per request through a [`RequestCache`].
//!
//! Two implementations share the [`Table`] trait:
//!
//! - [`LocalTable`](crate::LocalTable) fetches rows once per request and
//!   filters, sorts and pages them in memory.
//! - [`PushedDownTable`](crate::PushedDownTable) compiles its filters and
//!   sends them, with the sort and page, to a row source.
//!
//! Page numbers start at 1 and are clamped into `[1, page_count]` both when
//! set and when read.

use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use tracing::debug;

use crate::cache::{RequestCache, Revisions, TableId};
use crate::config::TableConfig;
use crate::error::Result;
use crate::expr::Expr;
use crate::extension::Extensions;
use crate::filter::Filter;
use crate::ordering::{Dir, OrderBy};
use crate::path::PropertyPath;

/// Page size used when none (or a non-positive one) is configured.
pub const DEFAULT_ENTRIES_PER_PAGE: usize = 10;

/// Configuration shared by every table implementation.
#[derive(Debug)]
pub struct TableState {
    id: TableId,
    revisions: Revisions,
    filters: BTreeMap<String, Filter>,
    sort_by: Option<PropertyPath>,
    sort_direction: Option<Dir>,
    current_page: usize,
    entries_per_page: usize,
    paging_enabled: bool,
    selected: HashSet<String>,
    extensions: Extensions,
}

impl Default for TableState {
    fn default() -> Self {
        TableState::new()
    }
}

impl TableState {
    /// Creates the state of a new table, with a fresh [`TableId`].
    pub fn new() -> Self {
        TableState {
            id: TableId::next(),
            revisions: Revisions::default(),
            filters: BTreeMap::new(),
            sort_by: None,
            sort_direction: None,
            current_page: 1,
            entries_per_page: DEFAULT_ENTRIES_PER_PAGE,
            paging_enabled: true,
            selected: HashSet::new(),
            extensions: Extensions::new(),
        }
    }

    /// Creates a state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured filter does not build.
    pub fn from_config(config: &TableConfig) -> Result<Self> {
        let mut state = TableState::new();
        state.apply_config(config)?;
        Ok(state)
    }

    /// Applies configuration on top of the current state.
    ///
    /// Configured filters are added under their names; other filters stay.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured filter does not build. The state is
    /// left unchanged in that case.
    pub fn apply_config(&mut self, config: &TableConfig) -> Result<()> {
        let filters = config.build_filters()?;
        self.set_entries_per_page(config.entries_per_page);
        self.set_paging_enabled(config.paging_enabled);
        match &config.sort_by {
            Some(path) => {
                let dir = config.sort_direction.unwrap_or_default();
                self.set_sort_by(path.clone(), Some(dir));
            }
            None => self.clear_sort(),
        }
        for (name, filter) in filters {
            self.set_filter(name, filter);
        }
        Ok(())
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub(crate) fn revisions(&self) -> Revisions {
        self.revisions
    }

    pub(crate) fn model_replaced(&mut self) {
        self.revisions.model += 1;
        debug!(table = %self.id, "model replaced");
    }

    fn filters_changed(&mut self) {
        self.revisions.filters += 1;
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Adds or replaces the filter `name`, returning the previous one.
    pub fn set_filter(&mut self, name: impl Into<String>, filter: Filter) -> Option<Filter> {
        self.filters_changed();
        self.filters.insert(name.into(), filter)
    }

    /// Removes the filter `name`.
    pub fn remove_filter(&mut self, name: &str) -> Option<Filter> {
        let removed = self.filters.remove(name);
        if removed.is_some() {
            self.filters_changed();
        }
        removed
    }

    /// Removes every filter.
    pub fn clear_filters(&mut self) {
        if !self.filters.is_empty() {
            self.filters.clear();
            self.filters_changed();
        }
    }

    pub fn filter(&self, name: &str) -> Option<&Filter> {
        self.filters.get(name)
    }

    /// Active filters, in name order.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.filters.iter().map(|(name, filter)| (name.as_str(), filter))
    }

    /// Replaces the per-property extension overrides.
    pub fn set_extensions(&mut self, extensions: Extensions) {
        self.extensions = extensions;
        self.filters_changed();
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Conjunction of the compiled active filters, `None` when nothing
    /// filters.
    pub fn compiled_filter(&self) -> Option<Expr> {
        let expr = Expr::all(
            self.filters
                .values()
                .map(|filter| filter.compile(&self.extensions)),
        );
        if expr.is_true() {
            None
        } else {
            Some(expr)
        }
    }

    // ========================================================================
    // Sorting
    // ========================================================================

    /// Sets the sort property and direction.
    ///
    /// A `None` direction keeps the property but leaves rows unsorted.
    pub fn set_sort_by(&mut self, path: impl Into<PropertyPath>, dir: Option<Dir>) {
        self.sort_by = Some(path.into());
        self.sort_direction = dir;
        self.revisions.sort += 1;
    }

    /// Removes the sort.
    pub fn clear_sort(&mut self) {
        self.sort_by = None;
        self.sort_direction = None;
        self.revisions.sort += 1;
    }

    pub fn sort_by(&self) -> Option<&PropertyPath> {
        self.sort_by.as_ref()
    }

    pub fn sort_direction(&self) -> Option<Dir> {
        self.sort_direction
    }

    /// The active ordering, if both a property and a direction are set.
    pub fn order_by(&self) -> Option<OrderBy> {
        match (&self.sort_by, self.sort_direction) {
            (Some(path), Some(dir)) => Some(OrderBy::new(path.clone(), dir)),
            _ => None,
        }
    }

    /// The ordering list sent to a row source; empty when unsorted.
    pub fn orderings(&self) -> Vec<OrderBy> {
        self.order_by().into_iter().collect()
    }

    // ========================================================================
    // Paging
    // ========================================================================

    pub fn entries_per_page(&self) -> usize {
        self.entries_per_page
    }

    /// Sets the page size. Values of zero or less reset it to
    /// [`DEFAULT_ENTRIES_PER_PAGE`].
    pub fn set_entries_per_page(&mut self, n: i64) {
        self.entries_per_page = match usize::try_from(n) {
            Ok(n) if n > 0 => n,
            _ => DEFAULT_ENTRIES_PER_PAGE,
        };
    }

    pub fn paging_enabled(&self) -> bool {
        self.paging_enabled
    }

    pub fn set_paging_enabled(&mut self, enabled: bool) {
        self.paging_enabled = enabled;
    }

    /// Effective page size, `None` when paging is off.
    pub fn page_size(&self) -> Option<usize> {
        self.paging_enabled.then_some(self.entries_per_page)
    }

    /// Number of pages for `row_count` rows. Always at least 1.
    pub fn page_count(&self, row_count: usize) -> usize {
        match self.page_size() {
            Some(size) => row_count.div_ceil(size).max(1),
            None => 1,
        }
    }

    /// The requested page clamped for `row_count` rows.
    pub fn current_page(&self, row_count: usize) -> usize {
        self.clamp_page(self.current_page, row_count)
    }

    /// Stores `page` clamped for `row_count` rows and returns it.
    pub fn set_current_page(&mut self, page: usize, row_count: usize) -> usize {
        self.current_page = self.clamp_page(page, row_count);
        self.current_page
    }

    fn clamp_page(&self, page: usize, row_count: usize) -> usize {
        page.clamp(1, self.page_count(row_count))
    }

    /// Index range of the current page within `row_count` rows.
    pub fn page_range(&self, row_count: usize) -> Range<usize> {
        match self.page_size() {
            Some(size) => {
                let start = ((self.current_page(row_count) - 1) * size).min(row_count);
                start..(start + size).min(row_count)
            }
            None => 0..row_count,
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Keys of the rows the caller marked as selected.
    pub fn selected(&self) -> &HashSet<String> {
        &self.selected
    }

    pub fn selected_mut(&mut self) -> &mut HashSet<String> {
        &mut self.selected
    }
}

/// The shared interface of table implementations.
///
/// Reads take the [`RequestCache`] of the current request; configuration
/// goes through `&mut self`. Configuration should be final before the first
/// read of a request. A pushed-down table re-queries its source on every
/// row read, so a filter changed between two reads of one request makes
/// the two results disagree.
pub trait Table {
    /// Row type.
    type Row: 'static;

    /// What row reads return.
    type Rows<'c>
    where
        Self: 'c;

    fn state(&self) -> &TableState;

    fn state_mut(&mut self) -> &mut TableState;

    /// All filtered and sorted rows.
    fn rows<'c>(&'c self, cache: &'c mut RequestCache) -> Result<Self::Rows<'c>>;

    /// The filtered and sorted rows of the current page.
    fn page_rows<'c>(&'c self, cache: &'c mut RequestCache) -> Result<Self::Rows<'c>>;

    /// Number of rows after filtering, before paging.
    fn row_count(&self, cache: &mut RequestCache) -> Result<usize>;

    fn id(&self) -> TableId {
        self.state().id()
    }

    fn page_count(&self, cache: &mut RequestCache) -> Result<usize> {
        let count = self.row_count(cache)?;
        Ok(self.state().page_count(count))
    }

    /// The current page, clamped into `[1, page_count]`.
    fn current_page(&self, cache: &mut RequestCache) -> Result<usize> {
        let count = self.row_count(cache)?;
        Ok(self.state().current_page(count))
    }

    /// Moves to `page`, clamped into `[1, page_count]`. Returns the page set.
    fn set_current_page(&mut self, page: usize, cache: &mut RequestCache) -> Result<usize> {
        let count = self.row_count(cache)?;
        Ok(self.state_mut().set_current_page(page, count))
    }

    fn set_sort_by(&mut self, path: impl Into<PropertyPath>, dir: Option<Dir>) {
        self.state_mut().set_sort_by(path, dir);
    }

    fn sort_by(&self) -> Option<&PropertyPath> {
        self.state().sort_by()
    }

    fn sort_direction(&self) -> Option<Dir> {
        self.state().sort_direction()
    }

    fn clear_sort(&mut self) {
        self.state_mut().clear_sort();
    }

    fn set_filter(&mut self, name: impl Into<String>, filter: Filter) -> Option<Filter> {
        self.state_mut().set_filter(name, filter)
    }

    fn remove_filter(&mut self, name: &str) -> Option<Filter> {
        self.state_mut().remove_filter(name)
    }

    fn clear_filters(&mut self) {
        self.state_mut().clear_filters();
    }

    fn filter(&self, name: &str) -> Option<&Filter> {
        self.state().filter(name)
    }

    fn entries_per_page(&self) -> usize {
        self.state().entries_per_page()
    }

    fn set_entries_per_page(&mut self, n: i64) {
        self.state_mut().set_entries_per_page(n);
    }

    fn paging_enabled(&self) -> bool {
        self.state().paging_enabled()
    }

    fn set_paging_enabled(&mut self, enabled: bool) {
        self.state_mut().set_paging_enabled(enabled);
    }

    fn selected(&self) -> &HashSet<String> {
        self.state().selected()
    }

    fn selected_mut(&mut self) -> &mut HashSet<String> {
        self.state_mut().selected_mut()
    }

    fn set_extensions(&mut self, extensions: Extensions) {
        self.state_mut().set_extensions(extensions);
    }
}
