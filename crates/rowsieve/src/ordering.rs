//! Sort direction, order specifications and the local row sort.
//!
//! Local sorting resolves each row's key once, then runs a stable sort over
//! the keys. Keys form a total order:
//!
//! - null, nested rows and keys that fail to resolve come first
//! - values of different kinds order by kind: bool, number, timestamp, string
//! - strings compare lower-cased
//!
//! `Desc` reverses that order while keeping equal keys in their original
//! relative order.

use std::any::Any;
use std::cmp::{Ordering, Reverse};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::path::PropertyPath;
use crate::registry::PropertyResolver;
use crate::value::{Number, Timestamp, Value};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    pub fn is_asc(self) -> bool {
        matches!(self, Dir::Asc)
    }

    pub fn is_desc(self) -> bool {
        matches!(self, Dir::Desc)
    }

    /// Applies this direction to an ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ordering clause forwarded to a row source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderBy {
    pub path: PropertyPath,
    pub dir: Dir,
}

impl OrderBy {
    pub fn new(path: impl Into<PropertyPath>, dir: Dir) -> Self {
        OrderBy {
            path: path.into(),
            dir,
        }
    }

    pub fn asc(path: impl Into<PropertyPath>) -> Self {
        OrderBy::new(path, Dir::Asc)
    }

    pub fn desc(path: impl Into<PropertyPath>) -> Self {
        OrderBy::new(path, Dir::Desc)
    }
}

/// An owned, totally ordered sort key.
#[derive(Debug, Clone)]
pub enum SortKey {
    Null,
    Bool(bool),
    Number(Number),
    Timestamp(Timestamp),
    /// Lower-cased string.
    String(String),
}

impl SortKey {
    /// Resolves the key of `row` at `path`. Resolution failures give `Null`.
    pub fn resolve<T: Any>(resolver: &PropertyResolver, row: &T, path: &PropertyPath) -> Self {
        match resolver.resolve(row, path) {
            Ok(value) => SortKey::from(&value),
            Err(err) => {
                trace!(%path, error = %err, "sort key unresolved, sorted as null");
                SortKey::Null
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Bool(_) => 1,
            SortKey::Number(_) => 2,
            SortKey::Timestamp(_) => 3,
            SortKey::String(_) => 4,
        }
    }
}

impl From<&Value<'_>> for SortKey {
    fn from(value: &Value<'_>) -> Self {
        match value {
            Value::String(s) => SortKey::String(s.to_lowercase()),
            Value::Number(n) => SortKey::Number(*n),
            Value::Timestamp(t) => SortKey::Timestamp(*t),
            Value::Bool(b) => SortKey::Bool(*b),
            Value::Object(_) | Value::Null => SortKey::Null,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(*b),
            (SortKey::Timestamp(a), SortKey::Timestamp(b)) => a.cmp(b),
            (SortKey::String(a), SortKey::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

/// Stable-sorts `rows` by the property at `order.path`.
pub fn sort_rows<R: Any>(rows: &mut [R], order: &OrderBy, resolver: &PropertyResolver) {
    debug!(path = %order.path, dir = %order.dir, rows = rows.len(), "sorting rows");
    let key = |row: &R| SortKey::resolve(resolver, row, &order.path);
    match order.dir {
        Dir::Asc => rows.sort_by_cached_key(key),
        Dir::Desc => rows.sort_by_cached_key(|row| Reverse(key(row))),
    }
}

/// Like [`sort_rows`], returning the index each row had before sorting.
pub(crate) fn sort_rows_indexed<R: Any>(
    rows: &mut Vec<R>,
    order: &OrderBy,
    resolver: &PropertyResolver,
) -> Vec<usize> {
    debug!(path = %order.path, dir = %order.dir, rows = rows.len(), "sorting rows");
    let key = |row: &R| SortKey::resolve(resolver, row, &order.path);
    let mut tagged: Vec<(usize, R)> = rows.drain(..).enumerate().collect();
    match order.dir {
        Dir::Asc => tagged.sort_by_cached_key(|(_, row)| key(row)),
        Dir::Desc => tagged.sort_by_cached_key(|(_, row)| Reverse(key(row))),
    }
    let (positions, sorted): (Vec<usize>, Vec<R>) = tagged.into_iter().unzip();
    *rows = sorted;
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    #[test]
    fn dir_apply() {
        assert_eq!(Dir::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(Dir::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Dir::Desc.apply(Ordering::Equal), Ordering::Equal);
        assert_eq!(Dir::Desc.to_string(), "desc");
    }

    #[test]
    fn keys_rank_across_kinds() {
        let keys = [
            SortKey::String("a".into()),
            SortKey::Timestamp(Timestamp(0)),
            SortKey::Number(Number::I64(100)),
            SortKey::Bool(true),
            SortKey::Null,
        ];
        let mut sorted = keys.to_vec();
        sorted.sort();
        let ranks: Vec<u8> = sorted.iter().map(SortKey::rank).collect();
        assert_eq!(ranks, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn strings_compare_lowercased() {
        let a = SortKey::from(&Value::str("apple"));
        let b = SortKey::from(&Value::str("Banana"));
        assert!(a < b);
        assert_eq!(SortKey::from(&Value::str("X")), SortKey::from(&Value::str("x")));
    }

    #[test]
    fn numbers_compare_across_variants() {
        assert!(SortKey::Number(Number::I64(-1)) < SortKey::Number(Number::U64(1)));
        assert!(SortKey::Number(Number::F64(1.5)) < SortKey::Number(Number::I64(2)));
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: Option<&'static str>,
        id: u32,
    }

    fn resolver() -> PropertyResolver {
        let mut resolver = PropertyResolver::new();
        resolver
            .register::<Row>()
            .reader("name", ValueKind::String, |r| match r.name {
                Some(n) => Value::str(n),
                None => Value::Null,
            });
        resolver
    }

    fn row(name: Option<&'static str>, id: u32) -> Row {
        Row { name, id }
    }

    #[test]
    fn nulls_first_ascending_last_descending() {
        let resolver = resolver();
        let mut rows = vec![
            row(Some("c"), 1),
            row(Some("a"), 2),
            row(None, 3),
            row(Some("b"), 4),
        ];

        sort_rows(&mut rows, &OrderBy::asc("name"), &resolver);
        let names: Vec<_> = rows.iter().map(|r| r.name).collect();
        assert_eq!(names, [None, Some("a"), Some("b"), Some("c")]);

        sort_rows(&mut rows, &OrderBy::desc("name"), &resolver);
        let names: Vec<_> = rows.iter().map(|r| r.name).collect();
        assert_eq!(names, [Some("c"), Some("b"), Some("a"), None]);
    }

    #[test]
    fn sort_is_stable() {
        let resolver = resolver();
        let mut rows = vec![
            row(Some("b"), 1),
            row(Some("A"), 2),
            row(Some("b"), 3),
            row(Some("a"), 4),
        ];
        sort_rows(&mut rows, &OrderBy::desc("name"), &resolver);
        let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, [1, 3, 2, 4]);
    }

    #[test]
    fn indexed_sort_reports_prior_positions() {
        let resolver = resolver();
        let mut rows = vec![row(Some("c"), 1), row(Some("a"), 2), row(Some("b"), 3)];
        let positions = sort_rows_indexed(&mut rows, &OrderBy::asc("name"), &resolver);
        let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, [2, 3, 1]);
        assert_eq!(positions, [1, 2, 0]);
    }

    #[test]
    fn unresolved_keys_sort_as_null() {
        let resolver = resolver();
        let mut rows = vec![row(Some("b"), 1), row(Some("a"), 2)];
        sort_rows(&mut rows, &OrderBy::asc("missing"), &resolver);
        let ids: Vec<u32> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, [1, 2]);
    }
}
