//! A recording [`Executor`] for unit tests.

use crate::client::Executor;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) enum Reply {
    Rows(Vec<Row>),
    Affected(u64),
    Fail(OrmError),
}

/// Records every statement and answers from a queue of canned replies.
///
/// With an empty queue, queries return no rows and statements affect 0 rows.
#[derive(Default)]
pub(crate) struct MockExecutor {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    replies: Mutex<VecDeque<Reply>>,
    fail_batch: Mutex<Option<String>>,
    closed: AtomicBool,
}

impl MockExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn rows(self, rows: Vec<Row>) -> Self {
        self.reply(Reply::Rows(rows))
    }

    pub(crate) fn affected(self, n: u64) -> Self {
        self.reply(Reply::Affected(n))
    }

    pub(crate) fn fail(self, err: OrmError) -> Self {
        self.reply(Reply::Fail(err))
    }

    /// Make `batch_execute(statement)` fail.
    pub(crate) fn fail_batch(self, statement: &str) -> Self {
        *self.fail_batch.lock().unwrap() = Some(statement.to_string());
        self
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.calls().into_iter().map(|(sql, _)| sql).collect()
    }

    fn record(&self, sql: &str, params: &[Value]) -> Option<Reply> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        self.replies.lock().unwrap().pop_front()
    }
}

impl Executor for MockExecutor {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        match self.record(sql, params) {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Affected(_)) | None => Ok(Vec::new()),
            Some(Reply::Fail(err)) => Err(err),
        }
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        match self.record(sql, params) {
            Some(Reply::Affected(n)) => Ok(n),
            Some(Reply::Rows(rows)) => Ok(rows.len() as u64),
            None => Ok(0),
            Some(Reply::Fail(err)) => Err(err),
        }
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        self.calls.lock().unwrap().push((sql.to_string(), Vec::new()));
        if self.fail_batch.lock().unwrap().as_deref() == Some(sql) {
            return Err(OrmError::Other(format!("{sql} failed")));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Rows of a `users(id, name, age)` table.
pub(crate) fn user_rows(rows: &[(i64, &str, i64)]) -> Vec<Row> {
    rows.iter()
        .map(|&(id, name, age)| {
            Row::from_pairs([
                ("id", Value::Int(id)),
                ("name", Value::from(name)),
                ("age", Value::Int(age)),
            ])
        })
        .collect()
}
