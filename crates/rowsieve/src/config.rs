//! Serializable table defaults and filter definitions.
//!
//! Tables are usually configured in code, but their defaults (page size,
//! initial sort, standing filters) can also come from YAML or JSON:
//!
//! ```yaml
//! entries_per_page: 25
//! sort_by: name
//! sort_direction: asc
//! filters:
//!   staff:
//!     type: comparison
//!     mode: 1
//!     properties: [title]
//!     pattern: "chancellor"
//!     matcher: search
//! ```
//!
//! Filter modes are integer codes (0 all, 1 any, 2 none); an unknown code is
//! read as "any".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SieveError};
use crate::expr::Expr;
use crate::filter::{Filter, Mode};
use crate::matcher::Matcher;
use crate::ordering::Dir;
use crate::path::PropertyPath;
use crate::table::DEFAULT_ENTRIES_PER_PAGE;

fn default_entries_per_page() -> i64 {
    DEFAULT_ENTRIES_PER_PAGE as i64
}

fn default_true() -> bool {
    true
}

fn default_mode() -> i64 {
    Mode::Any.code()
}

/// Table defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Page size; zero or less means the default of 10.
    #[serde(default = "default_entries_per_page")]
    pub entries_per_page: i64,
    #[serde(default = "default_true")]
    pub paging_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<PropertyPath>,
    /// Direction for `sort_by`; ascending when left out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<Dir>,
    /// Standing filters by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, FilterSpec>,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            entries_per_page: default_entries_per_page(),
            paging_enabled: true,
            sort_by: None,
            sort_direction: None,
            filters: BTreeMap::new(),
        }
    }
}

impl TableConfig {
    /// Parses a YAML document.
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Parses a JSON document.
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Builds every configured filter.
    ///
    /// # Errors
    ///
    /// [`SieveError::InvalidConfig`] naming the first filter that fails.
    pub fn build_filters(&self) -> Result<Vec<(String, Filter)>> {
        self.filters
            .iter()
            .map(|(name, spec)| {
                spec.build()
                    .map(|filter| (name.clone(), filter))
                    .map_err(|err| SieveError::InvalidConfig(format!("filter '{}': {}", name, err)))
            })
            .collect()
    }
}

/// Matcher names used in filter definitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherName {
    Exact,
    Regex,
    #[default]
    Search,
}

/// Serializable form of a [`Filter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterSpec {
    Comparison {
        #[serde(default = "default_mode")]
        mode: i64,
        properties: Vec<PropertyPath>,
        pattern: String,
        #[serde(default)]
        matcher: MatcherName,
        /// Only used by the regex matcher.
        #[serde(default)]
        case_insensitive: bool,
    },
    And {
        filters: Vec<FilterSpec>,
    },
    Or {
        filters: Vec<FilterSpec>,
    },
    Not {
        filter: Box<FilterSpec>,
    },
    Raw {
        expr: Expr,
    },
}

impl FilterSpec {
    /// Parses a YAML filter definition.
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Parses a JSON filter definition.
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Builds the filter tree.
    ///
    /// # Errors
    ///
    /// Returns an error if a regex pattern is invalid.
    pub fn build(&self) -> Result<Filter> {
        match self {
            FilterSpec::Comparison {
                mode,
                properties,
                pattern,
                matcher,
                case_insensitive,
            } => {
                let matcher = match matcher {
                    MatcherName::Exact => Matcher::Exact,
                    MatcherName::Regex => Matcher::Regex {
                        case_insensitive: *case_insensitive,
                    },
                    MatcherName::Search => Matcher::Search,
                };
                Filter::comparison(Mode::from_code(*mode), properties, pattern, matcher)
            }
            FilterSpec::And { filters } => Ok(Filter::And(build_all(filters)?)),
            FilterSpec::Or { filters } => Ok(Filter::Or(build_all(filters)?)),
            FilterSpec::Not { filter } => Ok(Filter::negate(filter.build()?)),
            FilterSpec::Raw { expr } => Ok(Filter::Raw(expr.clone())),
        }
    }
}

fn build_all(specs: &[FilterSpec]) -> Result<Vec<Filter>> {
    specs.iter().map(FilterSpec::build).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_document() {
        let config = TableConfig::from_json("{}").unwrap();
        assert_eq!(config, TableConfig::default());
        assert_eq!(config.entries_per_page, 10);
        assert!(config.paging_enabled);
    }

    #[test]
    fn yaml_table_config() {
        let config = TableConfig::from_yaml(
            r#"
entries_per_page: 25
paging_enabled: false
sort_by: address.city
sort_direction: desc
filters:
  staff:
    type: comparison
    properties: [title, name]
    pattern: chancellor
"#,
        )
        .unwrap();
        assert_eq!(config.entries_per_page, 25);
        assert!(!config.paging_enabled);
        assert_eq!(config.sort_by, Some(PropertyPath::from("address.city")));
        assert_eq!(config.sort_direction, Some(Dir::Desc));

        let filters = config.build_filters().unwrap();
        assert_eq!(filters.len(), 1);
        match &filters[0].1 {
            Filter::Comparison(cmp) => {
                assert_eq!(cmp.mode(), Mode::Any);
                assert_eq!(cmp.matcher(), Matcher::Search);
                assert_eq!(cmp.properties().len(), 2);
            }
            other => panic!("unexpected filter: {other:?}"),
        }
    }

    #[test]
    fn out_of_range_mode_clamps_to_any() {
        let spec = FilterSpec::from_json(
            r#"{"type": "comparison", "mode": 42, "properties": ["name"], "pattern": "x"}"#,
        )
        .unwrap();
        match spec.build().unwrap() {
            Filter::Comparison(cmp) => assert_eq!(cmp.mode(), Mode::Any),
            other => panic!("unexpected filter: {other:?}"),
        }
    }

    #[test]
    fn nested_filter_spec() {
        let spec = FilterSpec::from_yaml(
            r#"
type: not
filter:
  type: or
  filters:
    - type: comparison
      mode: 0
      properties: [name]
      pattern: "Rid.*"
      matcher: regex
      case_insensitive: true
    - type: raw
      expr:
        native: "archived = false"
"#,
        )
        .unwrap();
        let filter = spec.build().unwrap();
        let Filter::Not(inner) = filter else {
            panic!("expected not");
        };
        let Filter::Or(children) = *inner else {
            panic!("expected or");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[1], Filter::Raw(Expr::Native("archived = false".into())));
    }

    #[test]
    fn invalid_regex_names_filter() {
        let config = TableConfig::from_json(
            r#"{"filters": {"broken": {"type": "comparison", "properties": ["a"], "pattern": "(", "matcher": "regex"}}}"#,
        )
        .unwrap();
        let err = config.build_filters().unwrap_err();
        assert!(err.to_string().contains("filter 'broken'"));
    }

    #[test]
    fn malformed_documents_are_config_errors() {
        let err = TableConfig::from_yaml("entries_per_page: [").unwrap_err();
        assert!(matches!(err, SieveError::InvalidConfig(_)));
        let err = FilterSpec::from_json(r#"{"type": "xor"}"#).unwrap_err();
        assert!(matches!(err, SieveError::InvalidConfig(_)));
    }
}
