pub mod cache;
pub mod config;
pub mod dao;
pub mod error;
pub mod executor;
pub mod logging;
pub mod sql;
pub mod value;

pub use cache::{CacheStats, QueryCache};
pub use config::DaoConfig;
pub use dao::{Dao, PreparedBatch, PreparedStatement};
pub use error::{DaoError, Result};
pub use executor::{Executor, WriteOutcome};
pub use sql::{FilterChain, ParamNaming, Params, PlaceholderStyle, StatementBuilder};
pub use value::{Record, SqlValue};
