//! Statement skeletons for a single table.
//!
//! Every builder here is a pure string transform: the table name and the
//! record's columns go in, a statement with named placeholders comes out.
//! Predicates are appended separately by the caller.

use std::collections::HashSet;

use crate::error::{DaoError, Result};
use crate::sql::params::PlaceholderStyle;
use crate::value::Record;

#[derive(Debug, Clone)]
pub struct StatementBuilder {
    table: String,
    style: PlaceholderStyle,
}

impl StatementBuilder {
    pub fn new(table: &str, style: PlaceholderStyle) -> Self {
        Self {
            table: table.to_string(),
            style,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// `INSERT INTO <table> (<cols>) VALUES(<placeholders>)`
    ///
    /// Column order follows the first record. The rest of the batch must
    /// carry the same column set, in any order.
    pub fn build_insert(&self, rows: &[Record]) -> Result<String> {
        let first = rows
            .first()
            .ok_or_else(|| DaoError::schema_mismatch("insert batch is empty"))?;
        if first.is_empty() {
            return Err(DaoError::schema_mismatch("insert record has no columns"));
        }

        let expected: HashSet<&str> = first.columns().collect();
        for (index, row) in rows.iter().enumerate().skip(1) {
            let actual: HashSet<&str> = row.columns().collect();
            if actual != expected {
                return Err(DaoError::schema_mismatch(format!(
                    "record {} has columns {:?}, expected {:?}",
                    index,
                    row.columns().collect::<Vec<_>>(),
                    first.columns().collect::<Vec<_>>()
                )));
            }
        }

        let columns: Vec<&str> = first.columns().collect();
        let placeholders: Vec<String> = columns.iter().map(|c| self.style.token(c)).collect();

        Ok(format!(
            "INSERT INTO {} ({}) VALUES({})",
            self.table,
            columns.join(","),
            placeholders.join(",")
        ))
    }

    /// `UPDATE <table> SET col = <placeholder>, ...` in record order
    pub fn build_update(&self, record: &Record) -> Result<String> {
        if record.is_empty() {
            return Err(DaoError::schema_mismatch("update record has no columns"));
        }

        let pairs: Vec<String> = record
            .columns()
            .map(|column| format!("{} = {}", column, self.style.token(column)))
            .collect();

        Ok(format!("UPDATE {} SET {}", self.table, pairs.join(", ")))
    }

    pub fn build_delete(&self) -> String {
        format!("DELETE FROM {}", self.table)
    }

    pub fn build_select(&self) -> String {
        format!("SELECT * FROM {}", self.table)
    }

    /// Introspection read used to discover the primary key column
    pub fn build_show_keys(&self) -> String {
        format!("SHOW KEYS FROM {}", self.table)
    }
}
