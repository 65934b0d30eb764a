//! `sql-dao` prints the statement and bindings a plan would produce,
//! without touching a database.
//!
//! ```text
//! sql-dao [--config PATH] [PLAN.json | -]
//! ```
//!
//! A plan looks like:
//!
//! ```json
//! {
//!   "table": "users",
//!   "operation": "select",
//!   "filters": [
//!     {"column": "age", "op": ">", "value": 18},
//!     {"connector": "and", "column": "status", "op": "=", "value": "active"}
//!   ]
//! }
//! ```

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use std::{env, fs, io};
use tracing::debug;

use sql_dao::sql::FilterStep;
use sql_dao::{
    logging, Dao, DaoConfig, Executor, FilterChain, Params, Record, WriteOutcome,
};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Deserialize)]
struct StatementPlan {
    table: String,
    operation: Operation,
    #[serde(default)]
    filters: Vec<FilterStep>,
    /// Hand-written SELECT used instead of the generated one
    #[serde(default)]
    sql: Option<String>,
    /// Single record for insert/update
    #[serde(default)]
    record: Option<serde_json::Value>,
    /// Batch for insert
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

/// Stand-in executor: prepare_* never reaches it
struct DryRun;

impl Executor for DryRun {
    fn execute(&mut self, sql: &str, _params: &Params) -> Result<Vec<Record>> {
        Err(anyhow!("dry run cannot execute: {}", sql))
    }

    fn execute_write(&mut self, sql: &str, _params: &Params) -> Result<WriteOutcome> {
        Err(anyhow!("dry run cannot execute: {}", sql))
    }

    fn commit(&mut self) -> Result<()> {
        Ok(())
    }
}

struct Args {
    config: Option<PathBuf>,
    plan: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        plan: None,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("usage: sql-dao [--config PATH] [PLAN.json | -]");
                std::process::exit(0);
            }
            "-" => args.plan = None,
            other if other.starts_with("--") => bail!("unknown option {}", other),
            other => args.plan = Some(PathBuf::from(other)),
        }
    }
    Ok(args)
}

fn read_plan(path: Option<&PathBuf>) -> Result<StatementPlan> {
    let contents = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading plan {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading plan from stdin")?;
            buffer
        }
    };
    serde_json::from_str(&contents).context("parsing plan")
}

fn to_record(value: &serde_json::Value) -> Result<Record> {
    Record::from_json(value).ok_or_else(|| anyhow!("records must be JSON objects, got {}", value))
}

fn render_plan(plan: &StatementPlan, config: &DaoConfig) -> Result<serde_json::Value> {
    let mut dao = Dao::with_config(&plan.table, DryRun, config);
    *dao.filters_mut() = FilterChain::from_steps(&plan.filters)?;

    let output = match plan.operation {
        Operation::Select => serde_json::to_value(dao.prepare_find(plan.sql.as_deref())?)?,
        Operation::Insert => {
            let mut records = plan
                .records
                .iter()
                .map(to_record)
                .collect::<Result<Vec<_>>>()?;
            if let Some(record) = &plan.record {
                records.insert(0, to_record(record)?);
            }
            serde_json::to_value(dao.prepare_insert(&records)?)?
        }
        Operation::Update => {
            let record = plan
                .record
                .as_ref()
                .context("update needs a \"record\"")?;
            serde_json::to_value(dao.prepare_update(&to_record(record)?)?)?
        }
        Operation::Delete => serde_json::to_value(dao.prepare_delete()?)?,
    };
    Ok(output)
}

fn main() -> Result<()> {
    logging::init_tracing()?;

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => DaoConfig::load_from(path)?,
        None => DaoConfig::load()?,
    };
    debug!(target: "system", "Using config {:?}", config);

    let plan = read_plan(args.plan.as_ref())?;
    let output = render_plan(&plan, &config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
