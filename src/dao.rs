//! Table-scoped data access object.
//!
//! A [`Dao`] owns a filter chain, a statement builder for its table, a
//! read cache and the injected [`Executor`]. Reads go through the cache;
//! writes go straight to the executor and are committed one statement at a
//! time. Every operation also has a `prepare_*` twin that returns the SQL and
//! bindings without running anything.

use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheStats, QueryCache};
use crate::config::DaoConfig;
use crate::error::{DaoError, Result};
use crate::executor::{Executor, WriteOutcome};
use crate::sql::{FilterChain, ParamNaming, Params, StatementBuilder};
use crate::value::{Record, SqlValue};

/// Column of `SHOW KEYS` output that names the key column
pub const KEY_NAME_COLUMN: &str = "Column_name";

/// A statement ready to hand to an executor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedStatement {
    pub sql: String,
    pub params: Params,
}

/// One statement with a parameter set per record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedBatch {
    pub sql: String,
    pub rows: Vec<Params>,
}

pub struct Dao<E: Executor> {
    executor: E,
    builder: StatementBuilder,
    filters: FilterChain,
    cache: QueryCache,
    key_column: Option<String>,
    populate_keys: bool,
}

impl<E: Executor> Dao<E> {
    pub fn new(table: &str, executor: E) -> Self {
        Self::with_config(table, executor, &DaoConfig::default())
    }

    pub fn with_config(table: &str, executor: E, config: &DaoConfig) -> Self {
        Self {
            executor,
            builder: StatementBuilder::new(table, config.placeholder_style),
            filters: FilterChain::new(),
            cache: QueryCache::new(config.placeholder_style),
            key_column: config.key_column(table).map(str::to_string),
            populate_keys: config.populate_keys,
        }
    }

    pub fn table(&self) -> &str {
        self.builder.table()
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterChain {
        &mut self.filters
    }

    pub fn filter(&mut self, column: &str) -> Result<&mut FilterChain> {
        self.filters.filter(column)
    }

    pub fn and(&mut self, column: &str) -> Result<&mut FilterChain> {
        self.filters.and(column)
    }

    pub fn or(&mut self, column: &str) -> Result<&mut FilterChain> {
        self.filters.or(column)
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.get_cache_stats()
    }

    // ----- reads -----

    /// Statement and bindings `find_rows` would send.
    ///
    /// Without an override the statement is `SELECT * FROM <table>` plus the
    /// chain, with `param_` names. An override is used as written and the
    /// chain's bindings keep their bare column names.
    pub fn prepare_find(&self, statement_override: Option<&str>) -> Result<PreparedStatement> {
        let style = self.builder.style();
        match statement_override {
            None => {
                let clause = self.filters.render(ParamNaming::Prefixed, style)?;
                Ok(PreparedStatement {
                    sql: clause.append_to(&self.builder.build_select()),
                    params: clause.params,
                })
            }
            Some(sql) => {
                let clause = self.filters.render(ParamNaming::Verbatim, style)?;
                Ok(PreparedStatement {
                    sql: sql.to_string(),
                    params: clause.params,
                })
            }
        }
    }

    /// Run a read, served from the cache when the same effective query ran
    /// before on this DAO.
    ///
    /// The cache keeps the full result; `first_row_only` trims what is
    /// returned, so `find` and `first` share entries.
    pub fn find_rows(
        &mut self,
        statement_override: Option<&str>,
        first_row_only: bool,
    ) -> Result<Vec<Record>> {
        let prepared = self.prepare_find(statement_override)?;
        let mut rows = self.cached_read(&prepared)?;
        if first_row_only {
            rows.truncate(1);
        }
        Ok(rows)
    }

    pub fn find(&mut self) -> Result<Vec<Record>> {
        self.find_rows(None, false)
    }

    pub fn find_sql(&mut self, sql: &str) -> Result<Vec<Record>> {
        self.find_rows(Some(sql), false)
    }

    pub fn first(&mut self) -> Result<Option<Record>> {
        Ok(self.find_rows(None, true)?.pop())
    }

    pub fn first_sql(&mut self, sql: &str) -> Result<Option<Record>> {
        Ok(self.find_rows(Some(sql), true)?.pop())
    }

    fn cached_read(&mut self, prepared: &PreparedStatement) -> Result<Vec<Record>> {
        let query_hash = self.cache.query_hash(&prepared.sql, &prepared.params);
        if let Some(hit) = self.cache.get(&query_hash) {
            crate::trace_cache!("Cache hit for {} ({} rows)", prepared.sql, hit.rows.len());
            return Ok(hit.rows.clone());
        }

        crate::trace_cache!("Cache miss for {}", prepared.sql);
        crate::trace_query!(prepared.sql);
        let rows = self.executor.execute(&prepared.sql, &prepared.params)?;
        let stored = self.cache.store(query_hash, &prepared.sql, rows);
        Ok(stored.rows.clone())
    }

    /// Name of the table's primary key column.
    ///
    /// A key configured for the table wins; otherwise `SHOW KEYS` is read
    /// through the cache and the first row's `Column_name` is used.
    /// Composite keys are not handled.
    pub fn find_table_key(&mut self) -> Result<Option<String>> {
        if let Some(key) = &self.key_column {
            return Ok(Some(key.clone()));
        }

        let prepared = PreparedStatement {
            sql: self.builder.build_show_keys(),
            params: Params::new(),
        };
        let rows = self.cached_read(&prepared)?;
        let key = rows
            .first()
            .and_then(|row| row.get(KEY_NAME_COLUMN))
            .and_then(SqlValue::as_str)
            .map(str::to_string);
        debug!(target: "dao", "Primary key of {}: {:?}", self.table(), key);
        Ok(key)
    }

    // ----- writes -----

    pub fn prepare_insert(&self, records: &[Record]) -> Result<PreparedBatch> {
        let sql = self.builder.build_insert(records)?;
        Ok(PreparedBatch {
            sql,
            rows: records.iter().map(record_params).collect(),
        })
    }

    /// Insert one or more records and return them with the primary key
    /// filled in: the first record gets the executor's insert id, each
    /// following record the next integer.
    pub fn insert(&mut self, mut records: Vec<Record>) -> Result<Vec<Record>> {
        let prepared = self.prepare_insert(&records)?;
        let key = if self.populate_keys {
            self.find_table_key()?
        } else {
            None
        };

        crate::trace_query!(prepared.sql);
        debug!(target: "dao", "Inserting {} rows into {}", prepared.rows.len(), self.table());
        let outcome = match prepared.rows.as_slice() {
            [single] => self.executor.execute_write(&prepared.sql, single)?,
            rows => self.executor.execute_many(&prepared.sql, rows)?,
        };
        self.executor.commit()?;

        if let (Some(key), Some(first_id)) = (key, outcome.last_insert_id) {
            for (id, record) in (first_id..).zip(records.iter_mut()) {
                record.insert(&key, id);
            }
        }
        Ok(records)
    }

    pub fn insert_one(&mut self, record: Record) -> Result<Record> {
        self.insert(vec![record])?
            .pop()
            .ok_or_else(|| DaoError::schema_mismatch("insert returned no record"))
    }

    /// `SET` placeholders use bare column names, chain placeholders are
    /// `param_` prefixed, so both sets fit in one binding map.
    pub fn prepare_update(&self, record: &Record) -> Result<PreparedStatement> {
        let skeleton = self.builder.build_update(record)?;
        let clause = self
            .filters
            .render(ParamNaming::Prefixed, self.builder.style())?;

        let mut params = record_params(record);
        params.extend(clause.params.clone());
        Ok(PreparedStatement {
            sql: clause.append_to(&skeleton),
            params,
        })
    }

    /// Returns the affected row count
    pub fn update(&mut self, record: &Record) -> Result<u64> {
        let prepared = self.prepare_update(record)?;
        Ok(self.write(&prepared)?.affected_rows)
    }

    pub fn prepare_delete(&self) -> Result<PreparedStatement> {
        let clause = self
            .filters
            .render(ParamNaming::Prefixed, self.builder.style())?;
        Ok(PreparedStatement {
            sql: clause.append_to(&self.builder.build_delete()),
            params: clause.params,
        })
    }

    /// Returns the affected row count
    pub fn delete(&mut self) -> Result<u64> {
        let prepared = self.prepare_delete()?;
        Ok(self.write(&prepared)?.affected_rows)
    }

    fn write(&mut self, prepared: &PreparedStatement) -> Result<WriteOutcome> {
        crate::trace_query!(prepared.sql);
        let outcome = self.executor.execute_write(&prepared.sql, &prepared.params)?;
        self.executor.commit()?;
        debug!(target: "dao", "{} rows affected", outcome.affected_rows);
        Ok(outcome)
    }
}

fn record_params(record: &Record) -> Params {
    record
        .iter()
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect()
}
