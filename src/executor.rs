use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::sql::Params;
use crate::value::Record;

/// What a write statement reports back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    /// Auto-increment id of the first inserted row, when the driver knows it
    pub last_insert_id: Option<i64>,
    pub affected_rows: u64,
}

/// Trait for the database driver the DAO sends statements to
///
/// Implementations own the connection; the DAO never opens, retries or
/// closes anything itself.
pub trait Executor {
    /// Run a read statement and return every row
    fn execute(&mut self, sql: &str, params: &Params) -> Result<Vec<Record>>;

    /// Run a single write statement
    fn execute_write(&mut self, sql: &str, params: &Params) -> Result<WriteOutcome>;

    /// Run one write statement once per parameter set.
    ///
    /// The default reports the first insert id and the summed row count.
    fn execute_many(&mut self, sql: &str, rows: &[Params]) -> Result<WriteOutcome> {
        let mut outcome = WriteOutcome::default();
        for params in rows {
            let step = self.execute_write(sql, params)?;
            if outcome.last_insert_id.is_none() {
                outcome.last_insert_id = step.last_insert_id;
            }
            outcome.affected_rows += step.affected_rows;
        }
        Ok(outcome)
    }

    fn commit(&mut self) -> Result<()>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(&mut self, sql: &str, params: &Params) -> Result<Vec<Record>> {
        (**self).execute(sql, params)
    }

    fn execute_write(&mut self, sql: &str, params: &Params) -> Result<WriteOutcome> {
        (**self).execute_write(sql, params)
    }

    fn execute_many(&mut self, sql: &str, rows: &[Params]) -> Result<WriteOutcome> {
        (**self).execute_many(sql, rows)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&mut self, sql: &str, params: &Params) -> Result<Vec<Record>> {
        (**self).execute(sql, params)
    }

    fn execute_write(&mut self, sql: &str, params: &Params) -> Result<WriteOutcome> {
        (**self).execute_write(sql, params)
    }

    fn execute_many(&mut self, sql: &str, rows: &[Params]) -> Result<WriteOutcome> {
        (**self).execute_many(sql, rows)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    struct CountingWriter {
        next_id: i64,
    }

    impl Executor for CountingWriter {
        fn execute(&mut self, _sql: &str, _params: &Params) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }

        fn execute_write(&mut self, _sql: &str, _params: &Params) -> Result<WriteOutcome> {
            let id = self.next_id;
            self.next_id += 1;
            Ok(WriteOutcome {
                last_insert_id: Some(id),
                affected_rows: 1,
            })
        }

        fn commit(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_default_execute_many_reports_first_id() {
        let mut writer = CountingWriter { next_id: 40 };
        let mut row = Params::new();
        row.insert("name".to_string(), SqlValue::from("a"));
        let outcome = writer
            .execute_many("INSERT INTO t (name) VALUES(%(name)s)", &[row.clone(), row])
            .unwrap();
        assert_eq!(outcome.last_insert_id, Some(40));
        assert_eq!(outcome.affected_rows, 2);
    }

    #[test]
    fn test_boxed_executor_delegates() {
        let mut boxed: Box<dyn Executor> = Box::new(CountingWriter { next_id: 1 });
        let outcome = boxed.execute_write("DELETE FROM t", &Params::new()).unwrap();
        assert_eq!(outcome.last_insert_id, Some(1));
    }
}
