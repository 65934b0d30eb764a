//! Fluent filter chain rendered into a `WHERE` clause.
//!
//! A chain is a flat list of declarations joined by `AND`/`OR`. Each
//! declaration starts `Pending` when `filter`/`and`/`or` names its column and
//! becomes `Resolved` when exactly one comparator call supplies the value.
//! Calls made out of that order fail straight away with
//! [`DaoError::ChainOrder`], and a chain ending in a pending declaration
//! refuses to render.
//!
//! ```
//! use sql_dao::sql::{FilterChain, ParamNaming, PlaceholderStyle};
//!
//! let mut chain = FilterChain::new();
//! chain.filter("age")?.greater_than(18)?.and("status")?.equals("active")?;
//!
//! let clause = chain.render(ParamNaming::Prefixed, PlaceholderStyle::PyFormat)?;
//! assert_eq!(
//!     clause.text,
//!     "WHERE age > %(param_age)s AND status = %(param_status)s"
//! );
//! # Ok::<(), sql_dao::DaoError>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DaoError, Result};
use crate::sql::params::{next_free_index, ParamNaming, Params, PlaceholderStyle};
use crate::value::SqlValue;

/// Text emitted in place of an `IN`/`NOT IN` against an empty list
pub const EMPTY_LIST_TAUTOLOGY: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn as_sql(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Like,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl Comparator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Comparator::Equals => "=",
            Comparator::NotEquals => "!=",
            Comparator::GreaterThan => ">",
            Comparator::LessThan => "<",
            Comparator::GreaterOrEqual => ">=",
            Comparator::LessOrEqual => "<=",
            Comparator::Like => "LIKE",
            Comparator::In => "IN",
            Comparator::NotIn => "NOT IN",
            Comparator::IsNull => "IS NULL",
            Comparator::IsNotNull => "IS NOT NULL",
        }
    }
}

/// The value side of a resolved filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(SqlValue),
    List(Vec<SqlValue>),
    /// Null checks bind nothing
    Null,
}

/// A fully resolved declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub connector: Option<Connector>,
    pub column: String,
    pub comparator: Comparator,
    pub value: FilterValue,
}

impl Filter {
    /// `IN ()` would be invalid SQL, so an empty list renders as a bare `1`
    pub fn is_empty_list(&self) -> bool {
        matches!(&self.value, FilterValue::List(values) if values.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Declaration {
    Pending {
        connector: Option<Connector>,
        column: String,
    },
    Resolved(Filter),
}

/// Rendered predicate: `WHERE ...` text plus the values its placeholders need
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WhereClause {
    pub text: String,
    pub params: Params,
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append this clause to a statement skeleton
    pub fn append_to(&self, statement: &str) -> String {
        if self.is_empty() {
            statement.to_string()
        } else {
            format!("{} {}", statement, self.text)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    declarations: Vec<Declaration>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// True when no declaration is waiting for its comparator
    pub fn is_complete(&self) -> bool {
        !matches!(self.declarations.last(), Some(Declaration::Pending { .. }))
    }

    pub fn clear(&mut self) {
        self.declarations.clear();
    }

    /// Resolved filters in declaration order
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Resolved(filter) => Some(filter),
            Declaration::Pending { .. } => None,
        })
    }

    /// Start the chain. Later declarations are added with `and`/`or`.
    pub fn filter(&mut self, column: &str) -> Result<&mut Self> {
        if !self.is_empty() {
            return Err(DaoError::chain_order(format!(
                "filter(\"{}\") on a non-empty chain; extend it with and()/or() or clear() it first",
                column
            )));
        }
        self.push(None, column)
    }

    pub fn and(&mut self, column: &str) -> Result<&mut Self> {
        self.push(Some(Connector::And), column)
    }

    pub fn or(&mut self, column: &str) -> Result<&mut Self> {
        self.push(Some(Connector::Or), column)
    }

    /// `= value`, or `IS NULL` when the value is null
    pub fn equals(&mut self, value: impl Into<SqlValue>) -> Result<&mut Self> {
        let value = value.into();
        if value.is_null() {
            self.resolve(Comparator::IsNull, FilterValue::Null)
        } else {
            self.resolve(Comparator::Equals, FilterValue::Scalar(value))
        }
    }

    /// `!= value`, or `IS NOT NULL` when the value is null
    pub fn not_equals(&mut self, value: impl Into<SqlValue>) -> Result<&mut Self> {
        let value = value.into();
        if value.is_null() {
            self.resolve(Comparator::IsNotNull, FilterValue::Null)
        } else {
            self.resolve(Comparator::NotEquals, FilterValue::Scalar(value))
        }
    }

    pub fn greater_than(&mut self, value: impl Into<SqlValue>) -> Result<&mut Self> {
        self.resolve(Comparator::GreaterThan, FilterValue::Scalar(value.into()))
    }

    pub fn less_than(&mut self, value: impl Into<SqlValue>) -> Result<&mut Self> {
        self.resolve(Comparator::LessThan, FilterValue::Scalar(value.into()))
    }

    pub fn greater_or_equal(&mut self, value: impl Into<SqlValue>) -> Result<&mut Self> {
        self.resolve(Comparator::GreaterOrEqual, FilterValue::Scalar(value.into()))
    }

    pub fn less_or_equal(&mut self, value: impl Into<SqlValue>) -> Result<&mut Self> {
        self.resolve(Comparator::LessOrEqual, FilterValue::Scalar(value.into()))
    }

    /// Substring match: the value is always wrapped as `%value%`
    pub fn like(&mut self, value: impl Into<SqlValue>) -> Result<&mut Self> {
        let pattern = format!("%{}%", value.into());
        self.resolve(Comparator::Like, FilterValue::Scalar(SqlValue::String(pattern)))
    }

    /// `IN (...)`. An empty list makes the whole declaration a vacuous `1`.
    pub fn in_list<I, V>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.resolve(Comparator::In, FilterValue::List(values))
    }

    /// `NOT IN (...)`. An empty list also renders as `1`.
    pub fn not_in<I, V>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.resolve(Comparator::NotIn, FilterValue::List(values))
    }

    fn push(&mut self, connector: Option<Connector>, column: &str) -> Result<&mut Self> {
        match self.declarations.last() {
            None if connector.is_some() => {
                return Err(DaoError::chain_order(format!(
                    "{}(\"{}\") needs a preceding filter()",
                    connector.map_or("filter", |c| c.as_sql()).to_lowercase(),
                    column
                )));
            }
            Some(Declaration::Pending { column: pending, .. }) => {
                return Err(DaoError::chain_order(format!(
                    "\"{}\" is still waiting for a comparator",
                    pending
                )));
            }
            _ => {}
        }

        self.declarations.push(Declaration::Pending {
            connector,
            column: column.to_string(),
        });
        Ok(self)
    }

    fn resolve(&mut self, comparator: Comparator, value: FilterValue) -> Result<&mut Self> {
        let Some(last) = self.declarations.last_mut() else {
            return Err(DaoError::chain_order(format!(
                "{} called before filter()",
                comparator.as_sql()
            )));
        };

        let Declaration::Pending { connector, column } = last else {
            return Err(DaoError::chain_order(format!(
                "{} called but the last filter already has a value",
                comparator.as_sql()
            )));
        };

        let filter = Filter {
            connector: *connector,
            column: std::mem::take(column),
            comparator,
            value,
        };
        *last = Declaration::Resolved(filter);
        Ok(self)
    }

    /// Render the chain as `WHERE ...` plus its parameter bindings.
    ///
    /// An empty chain renders to an empty clause.
    pub fn render(&self, naming: ParamNaming, style: PlaceholderStyle) -> Result<WhereClause> {
        if self.is_empty() {
            return Ok(WhereClause::default());
        }

        let mut parts = vec!["WHERE".to_string()];
        let mut params = Params::new();

        for declaration in &self.declarations {
            let filter = match declaration {
                Declaration::Resolved(filter) => filter,
                Declaration::Pending { column, .. } => {
                    return Err(DaoError::chain_order(format!(
                        "cannot render: \"{}\" has no comparator",
                        column
                    )));
                }
            };

            if filter.is_empty_list() {
                parts.push(EMPTY_LIST_TAUTOLOGY.to_string());
                continue;
            }

            if let Some(connector) = filter.connector {
                parts.push(connector.as_sql().to_string());
            }
            parts.push(filter.column.clone());
            parts.push(filter.comparator.as_sql().to_string());

            let base = naming.apply(&filter.column);
            match &filter.value {
                FilterValue::Null => {}
                FilterValue::Scalar(value) => {
                    // a repeated scalar column must not overwrite the first binding
                    let name = if params.contains_key(&base) {
                        format!("{}_{}", base, next_free_index(&params, &base))
                    } else {
                        base
                    };
                    parts.push(style.token(&name));
                    params.insert(name, value.clone());
                }
                FilterValue::List(values) => {
                    let mut tokens = Vec::with_capacity(values.len());
                    for value in values {
                        let name = format!("{}_{}", base, next_free_index(&params, &base));
                        tokens.push(style.token(&name));
                        params.insert(name, value.clone());
                    }
                    parts.push(format!("({})", tokens.join(",")));
                }
            }
        }

        let text = parts.join(" ");
        debug!(target: "filter", "Rendered {} with {} params", text, params.len());
        Ok(WhereClause { text, params })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(chain: &FilterChain) -> WhereClause {
        chain
            .render(ParamNaming::Prefixed, PlaceholderStyle::PyFormat)
            .unwrap()
    }

    #[test]
    fn test_age_and_status_example() {
        let mut chain = FilterChain::new();
        chain
            .filter("age")
            .unwrap()
            .greater_than(18)
            .unwrap()
            .and("status")
            .unwrap()
            .equals("active")
            .unwrap();

        let clause = render(&chain);
        assert_eq!(
            clause.text,
            "WHERE age > %(param_age)s AND status = %(param_status)s"
        );
        assert_eq!(clause.params.len(), 2);
        assert_eq!(clause.params["param_age"], SqlValue::Integer(18));
        assert_eq!(clause.params["param_status"], SqlValue::from("active"));
    }

    #[test]
    fn test_empty_in_collapses_to_one() {
        let mut chain = FilterChain::new();
        chain.filter("tag").unwrap().in_list(Vec::<SqlValue>::new()).unwrap();
        let clause = render(&chain);
        assert_eq!(clause.text, "WHERE 1");
        assert!(clause.params.is_empty());
    }

    #[test]
    fn test_empty_not_in_drops_connector() {
        let mut chain = FilterChain::new();
        chain
            .filter("a")
            .unwrap()
            .equals(1)
            .unwrap()
            .or("tag")
            .unwrap()
            .not_in(Vec::<i64>::new())
            .unwrap();
        let clause = render(&chain);
        assert_eq!(clause.text, "WHERE a = %(param_a)s 1");
        assert_eq!(clause.params.len(), 1);
        assert!(!clause.text.contains("OR"));
    }

    #[test]
    fn test_null_checks_bind_nothing() {
        let mut chain = FilterChain::new();
        chain
            .filter("deleted_at")
            .unwrap()
            .equals(SqlValue::Null)
            .unwrap()
            .and("owner")
            .unwrap()
            .not_equals(Option::<i64>::None)
            .unwrap();
        let clause = render(&chain);
        assert_eq!(clause.text, "WHERE deleted_at IS NULL AND owner IS NOT NULL");
        assert!(clause.params.is_empty());
    }

    #[test]
    fn test_like_wraps_wildcards() {
        let mut chain = FilterChain::new();
        chain.filter("name").unwrap().like("ann").unwrap();
        let clause = render(&chain);
        assert_eq!(clause.text, "WHERE name LIKE %(param_name)s");
        assert_eq!(clause.params["param_name"], SqlValue::from("%ann%"));
    }

    #[test]
    fn test_in_list_expands_indexed_params() {
        let mut chain = FilterChain::new();
        chain.filter("id").unwrap().in_list([3, 5]).unwrap();
        let clause = render(&chain);
        assert_eq!(
            clause.text,
            "WHERE id IN (%(param_id_0)s,%(param_id_1)s)"
        );
        assert_eq!(clause.params["param_id_0"], SqlValue::Integer(3));
        assert_eq!(clause.params["param_id_1"], SqlValue::Integer(5));
    }

    #[test]
    fn test_repeated_list_column_gets_disjoint_names() {
        let mut chain = FilterChain::new();
        chain
            .filter("tag")
            .unwrap()
            .in_list(["a", "b"])
            .unwrap()
            .or("tag")
            .unwrap()
            .not_in(["c"])
            .unwrap();
        let clause = render(&chain);
        assert_eq!(
            clause.text,
            "WHERE tag IN (%(param_tag_0)s,%(param_tag_1)s) OR tag NOT IN (%(param_tag_2)s)"
        );
        assert_eq!(clause.params.len(), 3);
        assert_eq!(clause.params["param_tag_2"], SqlValue::from("c"));
    }

    #[test]
    fn test_repeated_scalar_column_keeps_both_values() {
        let mut chain = FilterChain::new();
        chain
            .filter("age")
            .unwrap()
            .greater_or_equal(18)
            .unwrap()
            .and("age")
            .unwrap()
            .less_or_equal(65)
            .unwrap();
        let clause = render(&chain);
        assert_eq!(
            clause.text,
            "WHERE age >= %(param_age)s AND age <= %(param_age_0)s"
        );
        assert_eq!(clause.params["param_age"], SqlValue::Integer(18));
        assert_eq!(clause.params["param_age_0"], SqlValue::Integer(65));
    }

    #[test]
    fn test_verbatim_naming() {
        let mut chain = FilterChain::new();
        chain.filter("id").unwrap().equals(9).unwrap();
        let clause = chain
            .render(ParamNaming::Verbatim, PlaceholderStyle::Colon)
            .unwrap();
        assert_eq!(clause.text, "WHERE id = :id");
        assert_eq!(clause.params["id"], SqlValue::Integer(9));
    }

    #[test]
    fn test_and_on_empty_chain_fails() {
        let mut chain = FilterChain::new();
        assert!(matches!(chain.and("x"), Err(DaoError::ChainOrder(_))));
        assert!(matches!(chain.or("x"), Err(DaoError::ChainOrder(_))));
    }

    #[test]
    fn test_comparator_before_filter_fails() {
        let mut chain = FilterChain::new();
        assert!(matches!(chain.equals(1), Err(DaoError::ChainOrder(_))));
    }

    #[test]
    fn test_comparator_twice_fails() {
        let mut chain = FilterChain::new();
        chain.filter("x").unwrap().equals(1).unwrap();
        assert!(matches!(chain.less_than(3), Err(DaoError::ChainOrder(_))));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_filter_without_comparator_fails() {
        let mut chain = FilterChain::new();
        chain.filter("x").unwrap();
        assert!(matches!(chain.and("y"), Err(DaoError::ChainOrder(_))));
        assert!(!chain.is_complete());
        assert!(matches!(
            chain.render(ParamNaming::Prefixed, PlaceholderStyle::PyFormat),
            Err(DaoError::ChainOrder(_))
        ));
    }

    #[test]
    fn test_second_filter_call_fails() {
        let mut chain = FilterChain::new();
        chain.filter("x").unwrap().equals(1).unwrap();
        assert!(matches!(chain.filter("y"), Err(DaoError::ChainOrder(_))));
        chain.clear();
        assert!(chain.filter("y").is_ok());
    }

    #[test]
    fn test_empty_chain_renders_nothing() {
        let clause = render(&FilterChain::new());
        assert!(clause.is_empty());
        assert_eq!(clause.append_to("SELECT * FROM t"), "SELECT * FROM t");
    }
}
