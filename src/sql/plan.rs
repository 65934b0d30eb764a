//! Serializable filter steps, for chains described in JSON or TOML rather
//! than built in code. Steps are replayed through the fluent methods so the
//! ordering rules are the same.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sql::predicate::{Connector, FilterChain};
use crate::value::SqlValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterStep {
    /// Absent for the first step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<Connector>,
    pub column: String,
    pub op: Operator,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl FilterStep {
    fn apply(&self, chain: &mut FilterChain) -> Result<()> {
        match self.connector {
            None => chain.filter(&self.column)?,
            Some(Connector::And) => chain.and(&self.column)?,
            Some(Connector::Or) => chain.or(&self.column)?,
        };

        match self.op {
            Operator::Equals => chain.equals(self.scalar())?,
            Operator::NotEquals => chain.not_equals(self.scalar())?,
            Operator::GreaterThan => chain.greater_than(self.scalar())?,
            Operator::LessThan => chain.less_than(self.scalar())?,
            Operator::GreaterOrEqual => chain.greater_or_equal(self.scalar())?,
            Operator::LessOrEqual => chain.less_or_equal(self.scalar())?,
            Operator::Like => chain.like(self.scalar())?,
            Operator::In => chain.in_list(self.list())?,
            Operator::NotIn => chain.not_in(self.list())?,
        };
        Ok(())
    }

    fn scalar(&self) -> SqlValue {
        SqlValue::from_json(&self.value)
    }

    /// A lone scalar is treated as a one-element list
    fn list(&self) -> Vec<SqlValue> {
        match &self.value {
            serde_json::Value::Array(items) => items.iter().map(SqlValue::from_json).collect(),
            serde_json::Value::Null => Vec::new(),
            other => vec![SqlValue::from_json(other)],
        }
    }
}

impl FilterChain {
    pub fn from_steps(steps: &[FilterStep]) -> Result<Self> {
        let mut chain = FilterChain::new();
        for step in steps {
            step.apply(&mut chain)?;
        }
        Ok(chain)
    }
}
