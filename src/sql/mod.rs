//! SQL text generation
//!
//! This module holds the pure parts of the DAO: statement skeletons,
//! the filter chain that renders `WHERE` clauses, and the parameter
//! naming rules shared by both.

pub mod params;
pub mod plan;
pub mod predicate;
pub mod statement;

pub use params::{ParamNaming, Params, PlaceholderStyle, PARAM_PREFIX};
pub use plan::{FilterStep, Operator};
pub use predicate::{Comparator, Connector, Filter, FilterChain, FilterValue, WhereClause};
pub use statement::StatementBuilder;
