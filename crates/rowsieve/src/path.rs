//! Dotted property paths.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between the segments of a [`PropertyPath`].
pub const SEPARATOR: char = '.';

/// A dotted path naming a possibly nested property, e.g. `"address.city"`.
///
/// Paths are cheap, transient values built from strings; segments are
/// resolved left to right by [`PropertyResolver`](crate::PropertyResolver).
///
/// ```
/// use rowsieve::PropertyPath;
///
/// let path = PropertyPath::new("address.city");
/// assert_eq!(path.split_head(), ("address", Some("city")));
/// assert_eq!(path.segments().collect::<Vec<_>>(), ["address", "city"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyPath(String);

impl PropertyPath {
    /// Creates a path from its dotted string form.
    pub fn new(path: impl Into<String>) -> Self {
        PropertyPath(path.into())
    }

    /// Returns the dotted string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits off the first segment, returning the remainder if any.
    pub fn split_head(&self) -> (&str, Option<&str>) {
        split_head(&self.0)
    }

    /// Iterates over the segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    /// Returns `true` if the path has more than one segment.
    pub fn is_nested(&self) -> bool {
        self.0.contains(SEPARATOR)
    }

    /// Returns `true` if the path is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Splits a dotted path at its first separator.
pub(crate) fn split_head(path: &str) -> (&str, Option<&str>) {
    match path.split_once(SEPARATOR) {
        Some((head, tail)) => (head, Some(tail)),
        None => (path, None),
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropertyPath {
    fn from(s: &str) -> Self {
        PropertyPath::new(s)
    }
}

impl From<String> for PropertyPath {
    fn from(s: String) -> Self {
        PropertyPath(s)
    }
}

impl From<&String> for PropertyPath {
    fn from(s: &String) -> Self {
        PropertyPath(s.clone())
    }
}

impl From<&PropertyPath> for PropertyPath {
    fn from(p: &PropertyPath) -> Self {
        p.clone()
    }
}

impl AsRef<str> for PropertyPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
