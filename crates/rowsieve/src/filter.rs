//! Filter trees and their two interpreters.
//!
//! A [`Filter`] is a closed tree of property comparisons joined by logical
//! operators. It is interpreted either in memory with
//! [`evaluate`](Filter::evaluate), as a predicate over rows already fetched,
//! or with [`compile`](Filter::compile), producing an [`Expr`] for a row
//! source to run. Both take the same [`Extensions`] so per-property overrides
//! behave alike on either path.
//!
//! # Comparison semantics
//!
//! A comparison tests one pattern against several properties and combines
//! the per-property results by [`Mode`]:
//!
//! ```text
//! All  = m(p1) ∧ m(p2) ∧ …
//! Any  = m(p1) ∨ m(p2) ∨ …
//! None = ¬(m(p1) ∨ m(p2) ∨ …)
//! ```
//!
//! A property that fails to resolve counts as not matching. A comparison
//! with no properties or an empty pattern matches every row.
//!
//! # Example
//!
//! ```
//! use rowsieve::{Filter, Mode, PropertyResolver, Extensions, Value, ValueKind};
//!
//! struct Wizard {
//!     name: String,
//!     email: String,
//! }
//!
//! let mut resolver = PropertyResolver::new();
//! resolver
//!     .register::<Wizard>()
//!     .reader("name", ValueKind::String, |w| Value::str(&w.name))
//!     .reader("email", ValueKind::String, |w| Value::str(&w.email));
//!
//! let row = Wizard { name: "Mustrum Ridcully".into(), email: "x".into() };
//! let any = Filter::exact(Mode::Any, ["email", "name"], "Mustrum Ridcully");
//! let all = Filter::exact(Mode::All, ["email", "name"], "Mustrum Ridcully");
//!
//! let exts = Extensions::new();
//! assert!(any.evaluate(&row, &resolver, &exts));
//! assert!(!all.evaluate(&row, &resolver, &exts));
//! ```

use std::any::Any;

use tracing::{debug, trace};

use crate::error::Result;
use crate::expr::{regex_to_like, search_to_like, Expr};
use crate::extension::Extensions;
use crate::matcher::{CompiledMatcher, Matcher};
use crate::path::PropertyPath;
use crate::registry::PropertyResolver;

/// How per-property matches combine in a [`Comparison`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Every property matches.
    All,
    /// At least one property matches.
    #[default]
    Any,
    /// No property matches.
    None,
}

impl Mode {
    /// Maps an integer mode code: 0 is `All`, 1 is `Any`, 2 is `None`.
    ///
    /// Any other code is treated as `Any`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Mode::All,
            1 => Mode::Any,
            2 => Mode::None,
            other => {
                trace!(code = other, "unknown filter mode, using any");
                Mode::Any
            }
        }
    }

    /// The integer code of this mode.
    pub fn code(self) -> i64 {
        match self {
            Mode::All => 0,
            Mode::Any => 1,
            Mode::None => 2,
        }
    }

    /// Returns the display name of this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::All => "all",
            Mode::Any => "any",
            Mode::None => "none",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pattern tested against an ordered set of properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    mode: Mode,
    properties: Vec<PropertyPath>,
    matcher: CompiledMatcher,
}

impl Comparison {
    /// Creates a comparison, compiling the pattern once.
    ///
    /// Duplicate properties are dropped, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns an error if a regex pattern is invalid.
    pub fn new<I, P>(mode: Mode, properties: I, pattern: &str, matcher: Matcher) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertyPath>,
    {
        Ok(Comparison {
            mode,
            properties: ordered_paths(properties),
            matcher: matcher.compile(pattern)?,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn properties(&self) -> &[PropertyPath] {
        &self.properties
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn matcher(&self) -> Matcher {
        self.matcher.matcher()
    }

    /// Returns `true` if this comparison matches every row.
    pub fn is_noop(&self) -> bool {
        self.properties.is_empty() || self.pattern().is_empty()
    }

    fn evaluate(&self, row: &dyn Any, resolver: &PropertyResolver, extensions: &Extensions) -> bool {
        if self.is_noop() {
            return true;
        }

        let mut all = true;
        let mut any = false;
        for path in &self.properties {
            let hit = self.matches_property(row, path, resolver, extensions);
            all &= hit;
            any |= hit;
            match self.mode {
                Mode::Any if hit => return true,
                Mode::None if hit => return false,
                Mode::All if !hit => return false,
                _ => {}
            }
        }

        match self.mode {
            Mode::All => all,
            Mode::Any => any,
            Mode::None => !any,
        }
    }

    fn matches_property(
        &self,
        row: &dyn Any,
        path: &PropertyPath,
        resolver: &PropertyResolver,
        extensions: &Extensions,
    ) -> bool {
        let value = match resolver.resolve_dyn(row, path.as_str()) {
            Ok(value) => value,
            Err(err) => {
                trace!(%path, error = %err, "property unresolved, counted as no match");
                return false;
            }
        };
        match extensions.get(path) {
            Some(ext) => ext.matches(&value, self.pattern()),
            None => self.matcher.matches(&value),
        }
    }

    fn compile(&self, extensions: &Extensions) -> Expr {
        if self.is_noop() {
            return Expr::True;
        }

        let pattern = self.pattern();
        let parts = self.properties.iter().map(|path| match extensions.get(path) {
            Some(ext) => ext.compile(path, pattern),
            None => match self.matcher() {
                Matcher::Exact => Expr::equals(path.clone(), pattern),
                Matcher::Regex { .. } => Expr::ilike(path.clone(), regex_to_like(pattern)),
                Matcher::Search => Expr::ilike(path.clone(), search_to_like(pattern)),
            },
        });

        match self.mode {
            Mode::All => Expr::all(parts),
            Mode::Any => Expr::any(parts),
            Mode::None => Expr::negate(Expr::any(parts)),
        }
    }
}

fn ordered_paths<P: Into<PropertyPath>>(properties: impl IntoIterator<Item = P>) -> Vec<PropertyPath> {
    let mut paths: Vec<PropertyPath> = Vec::new();
    for path in properties {
        let path = path.into();
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

/// A filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Pattern comparison over properties.
    Comparison(Comparison),
    /// Every child matches.
    And(Vec<Filter>),
    /// At least one child matches.
    Or(Vec<Filter>),
    /// The child does not match.
    Not(Box<Filter>),
    /// Backend expression with no in-memory meaning.
    Raw(Expr),
}

impl Filter {
    /// Comparison with an arbitrary matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if a regex pattern is invalid.
    pub fn comparison<I, P>(mode: Mode, properties: I, pattern: &str, matcher: Matcher) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertyPath>,
    {
        Comparison::new(mode, properties, pattern, matcher).map(Filter::Comparison)
    }

    /// Exact string comparison.
    pub fn exact<I, P>(mode: Mode, properties: I, pattern: &str) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertyPath>,
    {
        Filter::Comparison(Comparison {
            mode,
            properties: ordered_paths(properties),
            matcher: CompiledMatcher::exact(pattern),
        })
    }

    /// Literal, case-insensitive containment.
    ///
    /// # Errors
    ///
    /// Returns an error if the escaped pattern exceeds the regex size limit.
    pub fn search<I, P>(mode: Mode, properties: I, pattern: &str) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertyPath>,
    {
        Filter::comparison(mode, properties, pattern, Matcher::Search)
    }

    /// Whole-string regular expression match.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid.
    pub fn regex<I, P>(mode: Mode, properties: I, pattern: &str, case_insensitive: bool) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PropertyPath>,
    {
        Filter::comparison(mode, properties, pattern, Matcher::Regex { case_insensitive })
    }

    /// Conjunction of filters.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Disjunction of filters.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Negation of a filter.
    pub fn negate(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Backend-only expression.
    pub fn raw(expr: Expr) -> Self {
        Filter::Raw(expr)
    }

    /// Evaluates this filter against `row`.
    ///
    /// Never fails: properties that do not resolve count as not matching.
    /// A [`Filter::Raw`] node has no in-memory meaning and matches.
    pub fn evaluate<T: Any>(&self, row: &T, resolver: &PropertyResolver, extensions: &Extensions) -> bool {
        self.evaluate_dyn(row, resolver, extensions)
    }

    /// Type-erased form of [`evaluate`](Self::evaluate).
    pub fn evaluate_dyn(&self, row: &dyn Any, resolver: &PropertyResolver, extensions: &Extensions) -> bool {
        match self {
            Filter::Comparison(cmp) => cmp.evaluate(row, resolver, extensions),
            Filter::And(children) => children
                .iter()
                .all(|child| child.evaluate_dyn(row, resolver, extensions)),
            Filter::Or(children) => children
                .iter()
                .any(|child| child.evaluate_dyn(row, resolver, extensions)),
            Filter::Not(child) => !child.evaluate_dyn(row, resolver, extensions),
            Filter::Raw(expr) => {
                debug!(%expr, "raw filter skipped during in-memory evaluation");
                true
            }
        }
    }

    /// Compiles this filter into a backend expression.
    pub fn compile(&self, extensions: &Extensions) -> Expr {
        match self {
            Filter::Comparison(cmp) => cmp.compile(extensions),
            Filter::And(children) => Expr::all(children.iter().map(|c| c.compile(extensions))),
            Filter::Or(children) => Expr::any(children.iter().map(|c| c.compile(extensions))),
            Filter::Not(child) => Expr::negate(child.compile(extensions)),
            Filter::Raw(expr) => expr.clone(),
        }
    }
}

impl From<Comparison> for Filter {
    fn from(cmp: Comparison) -> Self {
        Filter::Comparison(cmp)
    }
}
