//! Parameter bindings and placeholder rendering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value::SqlValue;

/// Marker prepended to every parameter name generated from a filter chain
pub const PARAM_PREFIX: &str = "param_";

/// Named parameters bound to a statement
pub type Params = BTreeMap<String, SqlValue>;

/// How placeholders are written into statement text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `%(name)s`, the DB-API "pyformat" style used by MySQL drivers
    #[default]
    PyFormat,
    /// `:name`
    Colon,
}

impl PlaceholderStyle {
    pub fn token(self, name: &str) -> String {
        match self {
            PlaceholderStyle::PyFormat => format!("%({})s", name),
            PlaceholderStyle::Colon => format!(":{}", name),
        }
    }

    /// Regex matching one placeholder; capture group 1 is the name
    pub(crate) fn pattern(self) -> &'static str {
        match self {
            PlaceholderStyle::PyFormat => r"%\((\w+)\)s",
            PlaceholderStyle::Colon => r":(\w+)",
        }
    }
}

/// Whether chain parameters get the `param_` prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamNaming {
    /// `param_<column>`: generated statements, keeps clear of SET placeholders
    Prefixed,
    /// `<column>`: the caller wrote the statement and named the placeholders
    Verbatim,
}

impl ParamNaming {
    pub fn apply(self, column: &str) -> String {
        match self {
            ParamNaming::Prefixed => format!("{}{}", PARAM_PREFIX, column),
            ParamNaming::Verbatim => column.to_string(),
        }
    }
}

/// Lowest `n` such that `<base>_<n>` is not bound yet
pub(crate) fn next_free_index(params: &Params, base: &str) -> usize {
    let mut next = 0;
    while params.contains_key(&format!("{}_{}", base, next)) {
        next += 1;
    }
    next
}
