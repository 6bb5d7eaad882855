//! Rowsieve - filter, sort and page row collections behind a table.
//!
//! A table wraps a model (a source of rows) with named filters, a sort and
//! page state. Rows are addressed through a [`PropertyResolver`], a registry
//! of accessor functions keyed by row type and property name, so filters and
//! sorts work on dotted paths such as `owner.address.city` without knowing
//! the row types statically.
//!
//! The same configuration runs in two places:
//!
//! - [`LocalTable`] fetches rows from a [`ListModel`] and evaluates filters,
//!   sort and paging in memory, once per request.
//! - [`PushedDownTable`] compiles its filters to an [`Expr`] and hands them,
//!   with the ordering and page bounds, to a [`RowSource`] as a
//!   [`SourceQuery`].
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use rowsieve::{
//!     Dir, Filter, InMemoryModel, LocalTable, Mode, PropertyResolver, RequestCache, Table,
//!     ToValue, ValueKind,
//! };
//!
//! #[derive(Clone)]
//! struct Task {
//!     title: String,
//!     priority: u8,
//! }
//!
//! let mut resolver = PropertyResolver::new();
//! resolver
//!     .register::<Task>()
//!     .reader("title", ValueKind::String, |t| t.title.to_value())
//!     .reader("priority", ValueKind::Number, |t| t.priority.to_value());
//!
//! let tasks = InMemoryModel::new(vec![
//!     Task { title: "Write docs".into(), priority: 3 },
//!     Task { title: "Fix bug".into(), priority: 5 },
//!     Task { title: "Triage".into(), priority: 1 },
//! ]);
//!
//! let mut table = LocalTable::new(tasks, Arc::new(resolver));
//! table.set_filter("open", Filter::search(Mode::None, ["title"], "triage")?);
//! table.set_sort_by("priority", Some(Dir::Desc));
//!
//! let mut cache = RequestCache::new();
//! let titles: Vec<_> = table.rows(&mut cache)?.iter().map(|t| t.title.as_str()).collect();
//! assert_eq!(titles, ["Fix bug", "Write docs"]);
//! assert_eq!(table.page_count(&mut cache)?, 1);
//! # Ok::<(), rowsieve::SieveError>(())
//! ```
//!
//! # Filter Semantics
//!
//! A [`Comparison`] tests one pattern against several properties:
//!
//! | Mode | Matches when |
//! |------|--------------|
//! | `All` | every property matches |
//! | `Any` | at least one property matches |
//! | `None` | no property matches |
//!
//! Comparisons nest under `And`, `Or` and `Not`. Properties that fail to
//! resolve count as "no match" for that property. An empty pattern or an
//! empty property list matches every row.
//!
//! | Matcher | In memory | Compiled |
//! |---------|-----------|----------|
//! | `Exact` | text form equals pattern | `path = value` |
//! | `Regex` | whole text matches | `ILIKE` with `.*` as `%` and `.` as `_` |
//! | `Search` | case-insensitive substring | `ILIKE '%pattern%'` |
//!
//! # Request Cache
//!
//! Tables are long-lived; their rows are not. Reads take a [`RequestCache`]
//! owned by the current request (or any unit of work), which keeps one entry
//! per table. Dropping the cache drops every fetched row.
//!
//! # Derive
//!
//! With the `derive` feature, `#[derive(Properties)]` generates the
//! registration from struct fields. See [`Properties`].

mod cache;
mod config;
mod error;
mod expr;
mod extension;
mod filter;
mod local;
mod matcher;
mod model;
mod ordering;
mod path;
mod pushdown;
mod registry;
mod resolver;
mod table;
mod traits;
mod value;

// Re-export public API
pub use cache::{RequestCache, TableId};
pub use config::{FilterSpec, MatcherName, TableConfig};
pub use error::{BoxError, Result, SieveError};
pub use expr::{escape_like, regex_to_like, search_to_like, Expr, LIKE_ESCAPE};
pub use extension::{Extension, Extensions};
pub use filter::{Comparison, Filter, Mode};
pub use local::LocalTable;
pub use matcher::{CompiledMatcher, Matcher};
pub use model::{InMemoryModel, ListModel, ModelKind, QueryModel, RowSource, SourceQuery};
pub use ordering::{sort_rows, Dir, OrderBy, SortKey};
pub use path::{PropertyPath, SEPARATOR};
pub use pushdown::PushedDownTable;
pub use registry::{
    Accessor, FlagFn, NestedMutFn, PropertyResolver, ReadFn, Registration, WriteFn, FLAG_PREFIX,
};
pub use table::{Table, TableState, DEFAULT_ENTRIES_PER_PAGE};
pub use traits::{FromDatum, Properties, ToValue};
pub use value::{Datum, Number, PropertyType, Timestamp, Value, ValueKind};

#[cfg(feature = "derive")]
pub use rowsieve_macros::Properties;
