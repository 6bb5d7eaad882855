//! Per-request memoization of table results.
//!
//! A [`RequestCache`] lives for one unit of work (typically one request) and
//! is passed to every table read made during it. Tables address their entry
//! by [`TableId`]; the entry remembers which model, filter and sort revision
//! it was computed under, so a table changed since then sees exactly the
//! parts that are still valid:
//!
//! | change          | dropped                               |
//! |-----------------|---------------------------------------|
//! | model replaced  | everything                            |
//! | filters changed | rows, filtered/sorted flags, count    |
//! | sort changed    | sorted flag                           |
//!
//! Sorted rows remember their filtered position, so a new sort starts from
//! model order rather than from the previous sort's output.
//!
//! A cache must not be shared between concurrent requests.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a table, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(u64);

impl TableId {
    pub(crate) fn next() -> Self {
        TableId(NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The numeric form of this id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table-{}", self.0)
    }
}

/// Revision counters of the table state a cache entry depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Revisions {
    pub(crate) model: u64,
    pub(crate) filters: u64,
    pub(crate) sort: u64,
}

/// Cached results of one table for one request.
pub(crate) struct CacheEntry<R> {
    revisions: Revisions,
    pub(crate) rows: Option<Vec<R>>,
    pub(crate) filtered: bool,
    pub(crate) sorted: bool,
    /// Filtered index of each row, set while `rows` is reordered.
    pub(crate) positions: Option<Vec<usize>>,
    pub(crate) row_count: Option<usize>,
}

impl<R> CacheEntry<R> {
    fn new(revisions: Revisions) -> Self {
        CacheEntry {
            revisions,
            rows: None,
            filtered: false,
            sorted: false,
            positions: None,
            row_count: None,
        }
    }

    /// Drops whatever the table changed since this entry was filled.
    fn sync(&mut self, current: Revisions) {
        if self.revisions == current {
            return;
        }
        if self.revisions.model != current.model || self.revisions.filters != current.filters {
            self.rows = None;
            self.filtered = false;
            self.sorted = false;
            self.positions = None;
            self.row_count = None;
        } else {
            self.sorted = false;
        }
        self.revisions = current;
    }

    /// Stores freshly fetched rows, not yet filtered or sorted.
    pub(crate) fn store(&mut self, rows: Vec<R>) {
        self.rows = Some(rows);
        self.filtered = false;
        self.sorted = false;
        self.positions = None;
        self.row_count = None;
    }

    /// Puts reordered rows back in the order filtering left them in.
    pub(crate) fn restore_filtered_order(&mut self) {
        let (Some(rows), Some(positions)) = (self.rows.as_mut(), self.positions.take()) else {
            return;
        };
        let mut tagged: Vec<(usize, R)> = positions.into_iter().zip(rows.drain(..)).collect();
        tagged.sort_unstable_by_key(|(position, _)| *position);
        rows.extend(tagged.into_iter().map(|(_, row)| row));
    }
}

/// Memoization store for one unit of work.
///
/// ```
/// use rowsieve::{InMemoryModel, LocalTable, PropertyResolver, RequestCache, Table};
/// use std::sync::Arc;
///
/// let table = LocalTable::new(
///     InMemoryModel::new(vec![3, 1, 2]),
///     Arc::new(PropertyResolver::new()),
/// );
///
/// let mut cache = RequestCache::new();
/// assert_eq!(table.rows(&mut cache).unwrap(), &[3, 1, 2]);
/// assert!(cache.contains(table.id()));
/// ```
#[derive(Default)]
pub struct RequestCache {
    entries: HashMap<TableId, Box<dyn Any>>,
}

impl RequestCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        RequestCache::default()
    }

    /// Returns the entry of table `id`, synced to `revisions`.
    pub(crate) fn entry<R: 'static>(&mut self, id: TableId, revisions: Revisions) -> &mut CacheEntry<R> {
        let slot = self
            .entries
            .entry(id)
            .or_insert_with(|| Box::new(CacheEntry::<R>::new(revisions)));
        if !slot.is::<CacheEntry<R>>() {
            *slot = Box::new(CacheEntry::<R>::new(revisions));
        }
        let entry = slot
            .downcast_mut::<CacheEntry<R>>()
            .expect("cache slot holds the table's entry type after replacement");
        entry.sync(revisions);
        entry
    }

    /// Drops the entry of table `id`. Returns `true` if one existed.
    pub fn invalidate(&mut self, id: TableId) -> bool {
        let removed = self.entries.remove(&id).is_some();
        if removed {
            debug!(table = %id, "request cache entry invalidated");
        }
        removed
    }

    /// Returns `true` if table `id` has an entry.
    pub fn contains(&self, id: TableId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of tables with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for RequestCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCache")
            .field("len", &self.entries.len())
            .finish()
    }
}
