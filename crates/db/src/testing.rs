//! Scripted stand-ins for [`QueryExecutor`] and [`Connector`].
//!
//! Expectations are consumed in order; a statement that does not match the
//! next expectation panics with both texts so the failing test shows exactly
//! what diverged.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hcc_core::DbConfig;

use crate::error::DbError;
use crate::executor::{Connector, QueryExecutor};
use crate::row::{Row, SqlValue};

/// Build a row from anything convertible to [`SqlValue`].
pub fn row<I, V>(values: I) -> Row
where
    I: IntoIterator<Item = V>,
    V: Into<SqlValue>,
{
    Row::new(values.into_iter().map(Into::into).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Query,
    Exec,
}

enum Outcome {
    Rows(Vec<Row>),
    Affected(u64),
    Fail(DbError),
}

struct Expectation {
    kind: Kind,
    sql: String,
    outcome: Outcome,
}

#[derive(Default)]
struct State {
    pending: VecDeque<Expectation>,
    log: Vec<(Kind, String)>,
}

/// A [`QueryExecutor`] that replays a fixed script.
#[derive(Default)]
pub struct ScriptedExecutor {
    state: Mutex<State>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_query(&self, sql: impl Into<String>, rows: Vec<Row>) -> &Self {
        self.push(Kind::Query, sql.into(), Outcome::Rows(rows))
    }

    pub fn expect_query_error(&self, sql: impl Into<String>, err: DbError) -> &Self {
        self.push(Kind::Query, sql.into(), Outcome::Fail(err))
    }

    pub fn expect_exec(&self, sql: impl Into<String>, affected: u64) -> &Self {
        self.push(Kind::Exec, sql.into(), Outcome::Affected(affected))
    }

    pub fn expect_exec_error(&self, sql: impl Into<String>, err: DbError) -> &Self {
        self.push(Kind::Exec, sql.into(), Outcome::Fail(err))
    }

    /// Every statement run through `exec`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.lock()
            .log
            .iter()
            .filter(|(kind, _)| *kind == Kind::Exec)
            .map(|(_, sql)| sql.clone())
            .collect()
    }

    /// Every statement seen, queries and execs, in order.
    pub fn statements(&self) -> Vec<String> {
        self.lock().log.iter().map(|(_, sql)| sql.clone()).collect()
    }

    /// Panic if any scripted statement was never issued.
    pub fn assert_done(&self) {
        let state = self.lock();
        if let Some(next) = state.pending.front() {
            panic!(
                "{} scripted statement(s) not issued; next: {:?} {}",
                state.pending.len(),
                next.kind,
                next.sql
            );
        }
    }

    fn push(&self, kind: Kind, sql: String, outcome: Outcome) -> &Self {
        self.lock()
            .pending
            .push_back(Expectation { kind, sql, outcome });
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn take(&self, kind: Kind, sql: &str) -> Outcome {
        let mut state = self.lock();
        state.log.push((kind, sql.to_string()));
        let Some(next) = state.pending.pop_front() else {
            panic!("unscripted {kind:?}: {sql}");
        };
        if next.kind != kind || next.sql != sql {
            panic!(
                "statement mismatch\n  expected {:?}: {}\n  got      {kind:?}: {sql}",
                next.kind, next.sql
            );
        }
        next.outcome
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        match self.take(Kind::Query, sql) {
            Outcome::Rows(rows) => Ok(rows),
            Outcome::Fail(err) => Err(err),
            Outcome::Affected(_) => unreachable!("query scripted with an affected count"),
        }
    }

    async fn exec(&self, sql: &str) -> Result<u64, DbError> {
        match self.take(Kind::Exec, sql) {
            Outcome::Affected(n) => Ok(n),
            Outcome::Fail(err) => Err(err),
            Outcome::Rows(_) => unreachable!("exec scripted with rows"),
        }
    }
}

/// A [`Connector`] that hands out pre-registered [`ScriptedExecutor`]s by
/// instance name. Unknown instances fail to connect.
#[derive(Default)]
pub struct ScriptedConnector {
    instances: HashMap<String, Arc<ScriptedExecutor>>,
    attempts: Mutex<Vec<(String, String)>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(mut self, name: &str, executor: Arc<ScriptedExecutor>) -> Self {
        self.instances.insert(name.to_string(), executor);
        self
    }

    /// `(instance name, password)` for every connection attempt.
    pub fn attempts(&self) -> Vec<(String, String)> {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(
        &self,
        db: &DbConfig,
        password: &str,
    ) -> Result<Arc<dyn QueryExecutor>, DbError> {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((db.name.clone(), password.to_string()));
        match self.instances.get(&db.name) {
            Some(executor) => Ok(executor.clone() as Arc<dyn QueryExecutor>),
            None => Err(DbError::Driver(format!(
                "connection refused: {}",
                db.redacted_dsn()
            ))),
        }
    }
}
