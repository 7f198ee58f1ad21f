//! The database gateway.
//!
//! [`DatabaseGateway`] compiles a [`Statement`], logs it, runs it through the
//! injected [`DbExecutor`] and shapes the rows according to the statement
//! kind.

use std::sync::Arc;

use asyncorm_core::logging::statement_span;
use asyncorm_core::{OrmError, OrmResult};
use tracing::{debug, Instrument};

use crate::executor::DbExecutor;
use crate::query::statement::Statement;
use crate::row::Row;
use crate::value::Value;

/// The shaped result of one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Every row of a select.
    Rows(Vec<Row>),
    /// The row written by an insert or update.
    Row(Row),
    /// The result of a count.
    Count(i64),
    /// Nothing, for deletes and DDL.
    Empty,
}

impl Response {
    /// Returns the rows, wrapping a single row in a one-element vector.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Rows(rows) => rows,
            Self::Row(row) => vec![row],
            Self::Count(_) | Self::Empty => Vec::new(),
        }
    }

    /// Returns the single written row.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::DatabaseError`] for any other shape.
    pub fn into_row(self) -> OrmResult<Row> {
        match self {
            Self::Row(row) => Ok(row),
            other => Err(OrmError::DatabaseError(format!(
                "Expected a single row, got {other:?}"
            ))),
        }
    }

    /// Returns the count.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::DatabaseError`] for any other shape.
    pub fn into_count(self) -> OrmResult<i64> {
        match self {
            Self::Count(n) => Ok(n),
            other => Err(OrmError::DatabaseError(format!(
                "Expected a count, got {other:?}"
            ))),
        }
    }
}

/// Executes statements against one shared executor.
#[derive(Clone)]
pub struct DatabaseGateway {
    executor: Arc<dyn DbExecutor>,
}

impl std::fmt::Debug for DatabaseGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseGateway").finish_non_exhaustive()
    }
}

impl DatabaseGateway {
    /// Creates a gateway over `executor`.
    pub fn new(executor: Arc<dyn DbExecutor>) -> Self {
        Self { executor }
    }

    /// Returns the underlying executor.
    pub fn executor(&self) -> &Arc<dyn DbExecutor> {
        &self.executor
    }

    /// Runs one statement in its own transaction and shapes the result.
    ///
    /// # Errors
    ///
    /// Propagates executor errors unchanged, so a uniqueness violation
    /// surfaces as [`OrmError::UniqueViolation`]. An insert or update that
    /// returns no row is a [`OrmError::DatabaseError`].
    pub async fn request(&self, statement: &Statement) -> OrmResult<Response> {
        let action = statement.action();
        let compiled = statement.compile();

        let rows = async {
            debug!(action, sql = %compiled.sql, params = compiled.params.len(), "executing statement");
            self.executor
                .fetch_in_transaction(&compiled.sql, &compiled.params)
                .await
        }
        .instrument(statement_span(action))
        .await?;

        match statement {
            Statement::SelectAll { .. } | Statement::Select { .. } | Statement::SelectRelated { .. } => {
                Ok(Response::Rows(rows))
            }
            Statement::Insert { .. } | Statement::Update { .. } => rows
                .into_iter()
                .next_back()
                .map(Response::Row)
                .ok_or_else(|| {
                    OrmError::DatabaseError(format!("{action} statement returned no row"))
                }),
            Statement::Count { .. } => {
                let row = rows.into_iter().next().ok_or_else(|| {
                    OrmError::DatabaseError("count statement returned no row".to_string())
                })?;
                Ok(Response::Count(row.get_by_index::<i64>(0)?))
            }
            Statement::Delete { .. }
            | Statement::CreateTable { .. }
            | Statement::AddConstraint { .. }
            | Statement::CreateRelationTable { .. } => Ok(Response::Empty),
        }
    }

    /// Runs several statements, in order, inside one transaction.
    ///
    /// # Errors
    ///
    /// Propagates the first executor error; the whole batch is rolled back.
    pub async fn request_batch(&self, statements: &[Statement]) -> OrmResult<()> {
        if statements.is_empty() {
            return Ok(());
        }
        let compiled: Vec<(String, Vec<Value>)> = statements
            .iter()
            .map(|stmt| {
                let c = stmt.compile();
                debug!(action = stmt.action(), sql = %c.sql, "queued statement");
                (c.sql, c.params)
            })
            .collect();

        self.executor
            .execute_batch_in_transaction(&compiled)
            .instrument(statement_span("batch"))
            .await
    }
}
