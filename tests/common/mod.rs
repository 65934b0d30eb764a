#![allow(dead_code)]

use anyhow::{anyhow, Result};
use sql_dao::{Executor, Params, Record, WriteOutcome};
use std::collections::VecDeque;

/// One call the DAO made against the executor
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Execute(String, Params),
    Write(String, Params),
    Many(String, Vec<Params>),
    Commit,
}

/// In-memory executor that records every call and replays canned results
#[derive(Default)]
pub struct RecordingExecutor {
    pub calls: Vec<Call>,
    reads: VecDeque<Result<Vec<Record>>>,
    writes: VecDeque<WriteOutcome>,
    /// Rows returned for `SHOW KEYS`, independent of the read queue
    pub key_rows: Vec<Record>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: &str) -> Self {
        Self {
            key_rows: vec![Record::new()
                .with("Table", "users")
                .with("Non_unique", 0)
                .with("Key_name", "PRIMARY")
                .with("Column_name", key)],
            ..Self::default()
        }
    }

    pub fn push_rows(&mut self, rows: Vec<Record>) {
        self.reads.push_back(Ok(rows));
    }

    pub fn push_read_error(&mut self, message: &str) {
        self.reads.push_back(Err(anyhow!(message.to_string())));
    }

    pub fn push_write(&mut self, last_insert_id: Option<i64>, affected_rows: u64) {
        self.writes.push_back(WriteOutcome {
            last_insert_id,
            affected_rows,
        });
    }

    pub fn reads(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Execute(..)))
            .count()
    }

    pub fn commits(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Commit)).count()
    }
}

impl Executor for RecordingExecutor {
    fn execute(&mut self, sql: &str, params: &Params) -> Result<Vec<Record>> {
        self.calls.push(Call::Execute(sql.to_string(), params.clone()));
        if sql.starts_with("SHOW KEYS") {
            return Ok(self.key_rows.clone());
        }
        self.reads.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn execute_write(&mut self, sql: &str, params: &Params) -> Result<WriteOutcome> {
        self.calls.push(Call::Write(sql.to_string(), params.clone()));
        Ok(self.writes.pop_front().unwrap_or_default())
    }

    fn execute_many(&mut self, sql: &str, rows: &[Params]) -> Result<WriteOutcome> {
        self.calls.push(Call::Many(sql.to_string(), rows.to_vec()));
        Ok(self.writes.pop_front().unwrap_or_default())
    }

    fn commit(&mut self) -> Result<()> {
        self.calls.push(Call::Commit);
        Ok(())
    }
}

pub fn user(id: i64, name: &str) -> Record {
    Record::new().with("id", id).with("name", name)
}
