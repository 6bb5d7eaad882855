//! Per-property overrides for filter matching and compilation.
//!
//! An [`Extension`] replaces the default matcher of a comparison for one
//! property path, both when evaluating in memory and when compiling to an
//! [`Expr`]. Overrides travel with the call as an [`Extensions`] value, so
//! two tables (or two requests) can use different ones for the same filter.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::expr::Expr;
use crate::path::PropertyPath;
use crate::value::Value;

/// Custom matching for one property.
pub trait Extension: Send + Sync {
    /// Tests a resolved value against the comparison pattern.
    fn matches(&self, value: &Value<'_>, pattern: &str) -> bool;

    /// Produces the backend expression for this property and pattern.
    fn compile(&self, path: &PropertyPath, pattern: &str) -> Expr;
}

/// Extension overrides keyed by property path.
#[derive(Clone, Default)]
pub struct Extensions {
    overrides: HashMap<PropertyPath, Arc<dyn Extension>>,
}

impl Extensions {
    /// Creates an empty set of overrides.
    pub fn new() -> Self {
        Extensions::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, path: impl Into<PropertyPath>, extension: impl Extension + 'static) -> Self {
        self.insert(path, extension);
        self
    }

    /// Adds or replaces the override for `path`.
    pub fn insert(&mut self, path: impl Into<PropertyPath>, extension: impl Extension + 'static) {
        self.overrides.insert(path.into(), Arc::new(extension));
    }

    /// Returns the override for `path`, if any.
    pub fn get(&self, path: &PropertyPath) -> Option<&dyn Extension> {
        self.overrides.get(path).map(|ext| ext.as_ref())
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<&str> = self.overrides.keys().map(PropertyPath::as_str).collect();
        paths.sort_unstable();
        f.debug_struct("Extensions").field("paths", &paths).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Prefix;

    impl Extension for Prefix {
        fn matches(&self, value: &Value<'_>, pattern: &str) -> bool {
            value.as_str().is_some_and(|s| s.starts_with(pattern))
        }

        fn compile(&self, path: &PropertyPath, pattern: &str) -> Expr {
            Expr::ilike(path.clone(), format!("{}%", pattern))
        }
    }

    #[test]
    fn lookup_by_path() {
        let exts = Extensions::new().with("name", Prefix);
        assert_eq!(exts.len(), 1);
        let ext = exts.get(&"name".into()).expect("registered");
        assert!(ext.matches(&Value::str("Rincewind"), "Rin"));
        assert_eq!(
            ext.compile(&"name".into(), "Rin"),
            Expr::ilike("name", "Rin%")
        );
        assert!(exts.get(&"email".into()).is_none());
    }

    #[test]
    fn debug_lists_paths() {
        let exts = Extensions::new().with("b", Prefix).with("a", Prefix);
        assert_eq!(format!("{:?}", exts), "Extensions { paths: [\"a\", \"b\"] }");
    }
}
