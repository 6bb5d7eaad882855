//! Tables that filter, sort and page in memory.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheEntry, RequestCache};
use crate::config::TableConfig;
use crate::error::Result;
use crate::model::ListModel;
use crate::ordering::sort_rows_indexed;
use crate::registry::PropertyResolver;
use crate::table::{Table, TableState};

/// A table over a [`ListModel`] whose rows are processed in memory.
///
/// Within one request the model is fetched once, each active filter runs
/// once over the fetched rows and the survivors are sorted once. Later reads
/// in the same request slice the cached result. Changing the filters drops
/// the cached rows; changing the sort only re-sorts them.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rowsieve::{
///     Dir, Filter, InMemoryModel, LocalTable, Mode, PropertyResolver, RequestCache, Table,
///     Value, ValueKind,
/// };
///
/// #[derive(Clone)]
/// struct Wizard {
///     name: &'static str,
/// }
///
/// let mut resolver = PropertyResolver::new();
/// resolver
///     .register::<Wizard>()
///     .reader("name", ValueKind::String, |w| Value::str(w.name));
///
/// let model = InMemoryModel::new(vec![
///     Wizard { name: "Ridcully" },
///     Wizard { name: "Rincewind" },
///     Wizard { name: "Stibbons" },
/// ]);
/// let mut table = LocalTable::new(model, Arc::new(resolver));
/// table.set_filter("r", Filter::search(Mode::Any, ["name"], "ri")?);
/// table.set_sort_by("name", Some(Dir::Desc));
///
/// let mut cache = RequestCache::new();
/// let names: Vec<_> = table.rows(&mut cache)?.iter().map(|w| w.name).collect();
/// assert_eq!(names, ["Rincewind", "Ridcully"]);
/// # Ok::<(), rowsieve::SieveError>(())
/// ```
pub struct LocalTable<M> {
    model: M,
    resolver: Arc<PropertyResolver>,
    state: TableState,
}

impl<M> LocalTable<M>
where
    M: ListModel,
    M::Row: 'static,
{
    /// Creates a table with default state.
    pub fn new(model: M, resolver: Arc<PropertyResolver>) -> Self {
        LocalTable {
            model,
            resolver,
            state: TableState::new(),
        }
    }

    /// Creates a table with state read from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured filter does not build.
    pub fn with_config(model: M, resolver: Arc<PropertyResolver>, config: &TableConfig) -> Result<Self> {
        Ok(LocalTable {
            model,
            resolver,
            state: TableState::from_config(config)?,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Replaces the model, returning the old one.
    ///
    /// Cached results of this table are discarded in every request cache.
    pub fn set_model(&mut self, model: M) -> M {
        self.state.model_replaced();
        std::mem::replace(&mut self.model, model)
    }

    pub fn resolver(&self) -> &Arc<PropertyResolver> {
        &self.resolver
    }

    /// Brings this table's cache entry up to date: fetched, filtered and,
    /// when `sort` is set, sorted.
    fn prepare<'c>(&self, cache: &'c mut RequestCache, sort: bool) -> Result<&'c mut CacheEntry<M::Row>> {
        let entry = cache.entry::<M::Row>(self.state.id(), self.state.revisions());

        if entry.rows.is_none() {
            let rows = self.model.fetch()?;
            debug!(table = %self.state.id(), rows = rows.len(), "fetched rows from model");
            entry.store(rows);
        }

        if !entry.filtered {
            if let Some(rows) = entry.rows.as_mut() {
                self.apply_filters(rows);
                entry.row_count = Some(rows.len());
            }
            entry.filtered = true;
        }

        if sort && !entry.sorted {
            entry.restore_filtered_order();
            if let (Some(rows), Some(order)) = (entry.rows.as_mut(), self.state.order_by()) {
                entry.positions = Some(sort_rows_indexed(rows, &order, &self.resolver));
            }
            entry.sorted = true;
        }

        Ok(entry)
    }

    fn apply_filters(&self, rows: &mut Vec<M::Row>) {
        let extensions = self.state.extensions();
        for (name, filter) in self.state.filters() {
            let before = rows.len();
            rows.retain(|row| filter.evaluate(row, &self.resolver, extensions));
            debug!(
                table = %self.state.id(),
                filter = name,
                before,
                after = rows.len(),
                "applied filter"
            );
        }
    }
}

impl<M> Table for LocalTable<M>
where
    M: ListModel,
    M::Row: 'static,
{
    type Row = M::Row;
    type Rows<'c>
        = &'c [M::Row]
    where
        Self: 'c;

    fn state(&self) -> &TableState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut TableState {
        &mut self.state
    }

    fn rows<'c>(&'c self, cache: &'c mut RequestCache) -> Result<&'c [M::Row]> {
        let entry = self.prepare(cache, true)?;
        Ok(entry.rows.as_deref().unwrap_or_default())
    }

    fn page_rows<'c>(&'c self, cache: &'c mut RequestCache) -> Result<&'c [M::Row]> {
        let rows = self.rows(cache)?;
        Ok(&rows[self.state.page_range(rows.len())])
    }

    fn row_count(&self, cache: &mut RequestCache) -> Result<usize> {
        let entry = self.prepare(cache, false)?;
        Ok(entry.row_count.unwrap_or(0))
    }
}

impl<M: std::fmt::Debug> std::fmt::Debug for LocalTable<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTable")
            .field("model", &self.model)
            .field("state", &self.state)
            .finish()
    }
}
