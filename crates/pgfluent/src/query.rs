//! Compiled statements and their execution path.
//!
//! Every statement, whether produced by the builder or passed in as raw SQL, runs through
//! [`run`]: bind into segments, log, execute on the driver, classify failures.

use crate::binder::bind;
use crate::classify::classify;
use crate::client::SegmentClient;
use crate::error::{DbError, DbResult};
use crate::value::{RowMap, Value};
use std::fmt;
use std::time::Instant;

/// SQL text with `$n` placeholders plus the values they refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub values: Vec<Value>,
}

impl CompiledQuery {
    pub fn new(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }
}

/// Kind of statement being executed, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// Caller supplied SQL.
    Raw,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Raw => "raw",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execute one compiled statement on `client`.
pub(crate) async fn run<C: SegmentClient>(
    client: &C,
    kind: StatementKind,
    query: &CompiledQuery,
    max_sql_length: usize,
) -> DbResult<Vec<RowMap>> {
    let stmt = bind(&query.sql, &query.values)?;

    tracing::debug!(
        target: "pgfluent.sql",
        kind = kind.as_str(),
        param_count = stmt.param_count(),
        sql = %truncate_sql(&query.sql, max_sql_length),
        "executing statement"
    );

    let started = Instant::now();
    match client.query_segments(&stmt).await {
        Ok(rows) => {
            tracing::debug!(
                target: "pgfluent.sql",
                kind = kind.as_str(),
                rows = rows.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "statement completed"
            );
            Ok(rows)
        }
        Err(raw) => {
            let err = classify(raw);
            log_failure(kind, &err, &query.sql, max_sql_length);
            Err(err)
        }
    }
}

pub(crate) fn log_failure(kind: StatementKind, err: &DbError, sql: &str, max_sql_length: usize) {
    let sql = truncate_sql(sql, max_sql_length);
    if err.is_retryable() {
        tracing::warn!(
            target: "pgfluent.sql",
            kind = kind.as_str(),
            code = err.code(),
            sql = %sql,
            error = %err,
            "connection error"
        );
    } else {
        tracing::error!(
            target: "pgfluent.sql",
            kind = kind.as_str(),
            code = err.code(),
            sql = %sql,
            error = %err,
            "statement failed"
        );
    }
}

/// Truncate to at most `max_bytes` on a char boundary, marking the cut with `...`.
pub(crate) fn truncate_sql(sql: &str, max_bytes: usize) -> std::borrow::Cow<'_, str> {
    if sql.len() <= max_bytes {
        return sql.into();
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end]).into()
}
