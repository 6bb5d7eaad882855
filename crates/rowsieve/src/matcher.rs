//! Atomic text matchers used by filter comparisons.

use regex::{Regex, RegexBuilder};

use crate::error::Result;
use crate::value::Value;

/// How a comparison pattern is matched against a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Matcher {
    /// String form equals the pattern exactly.
    Exact,
    /// The whole string form matches the pattern as a regular expression.
    /// Dot matches newlines.
    Regex {
        /// Ignore case while matching.
        case_insensitive: bool,
    },
    /// The pattern occurs literally anywhere in the string form, ignoring case.
    #[default]
    Search,
}

impl Matcher {
    /// Case-sensitive whole-string regex matcher.
    pub const REGEX: Matcher = Matcher::Regex {
        case_insensitive: false,
    };

    /// Returns the display name of this matcher.
    pub fn as_str(self) -> &'static str {
        match self {
            Matcher::Exact => "exact",
            Matcher::Regex { .. } => "regex",
            Matcher::Search => "search",
        }
    }

    /// Compiles `pattern` for this matcher.
    ///
    /// # Errors
    ///
    /// [`SieveError::InvalidRegex`](crate::SieveError::InvalidRegex) when a
    /// regex pattern does not parse.
    pub fn compile(self, pattern: &str) -> Result<CompiledMatcher> {
        let regex = match self {
            Matcher::Exact => None,
            Matcher::Regex { case_insensitive } => Some(
                RegexBuilder::new(&format!("^(?:{})$", pattern))
                    .dot_matches_new_line(true)
                    .case_insensitive(case_insensitive)
                    .build()?,
            ),
            Matcher::Search => Some(
                RegexBuilder::new(&format!("^.*{}.*$", regex::escape(pattern)))
                    .dot_matches_new_line(true)
                    .case_insensitive(true)
                    .build()?,
            ),
        };
        Ok(CompiledMatcher {
            matcher: self,
            pattern: pattern.to_string(),
            regex,
        })
    }
}

/// A matcher with its pattern compiled once.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    matcher: Matcher,
    pattern: String,
    regex: Option<Regex>,
}

impl CompiledMatcher {
    /// Exact matcher; needs no compilation.
    pub(crate) fn exact(pattern: &str) -> Self {
        CompiledMatcher {
            matcher: Matcher::Exact,
            pattern: pattern.to_string(),
            regex: None,
        }
    }

    /// The matcher kind.
    pub fn matcher(&self) -> Matcher {
        self.matcher
    }

    /// The pattern as given.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Tests a resolved value. Null and nested rows never match.
    pub fn matches(&self, value: &Value<'_>) -> bool {
        let Some(text) = value.text() else {
            return false;
        };
        match &self.regex {
            Some(regex) => regex.is_match(&text),
            None => text == self.pattern,
        }
    }
}

impl PartialEq for CompiledMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.matcher == other.matcher && self.pattern == other.pattern
    }
}
