//! Driver seam for executing bound statements.

use crate::binder::BoundStatement;
use crate::error::DriverError;
use crate::row::row_to_map;
use crate::value::RowMap;
use std::future::Future;
use tokio_postgres::types::ToSql;

/// A driver that accepts statements in segment form.
///
/// Implementations run exactly one statement per call and return its rows already decoded
/// into [`RowMap`]s. Failures are reported in the raw [`DriverError`] shape; classification
/// happens above this trait.
pub trait SegmentClient: Send + Sync {
    /// Execute one bound statement and return all rows it produced.
    fn query_segments(
        &self,
        stmt: &BoundStatement,
    ) -> impl Future<Output = Result<Vec<RowMap>, DriverError>> + Send;
}

impl SegmentClient for tokio_postgres::Client {
    async fn query_segments(&self, stmt: &BoundStatement) -> Result<Vec<RowMap>, DriverError> {
        let sql = stmt.to_positional();
        let params: Vec<&(dyn ToSql + Sync)> =
            stmt.values().map(|v| v as &(dyn ToSql + Sync)).collect();
        let rows = self.query(sql.as_str(), &params).await?;
        rows.iter().map(row_to_map).collect()
    }
}

/// Pooled execution: checks out a connection for the duration of one statement.
#[cfg(feature = "pool")]
impl SegmentClient for deadpool_postgres::Pool {
    async fn query_segments(&self, stmt: &BoundStatement) -> Result<Vec<RowMap>, DriverError> {
        let conn = self.get().await?;
        let client: &tokio_postgres::Client = &conn;
        client.query_segments(stmt).await
    }
}

impl<C: SegmentClient> SegmentClient for &C {
    fn query_segments(
        &self,
        stmt: &BoundStatement,
    ) -> impl Future<Output = Result<Vec<RowMap>, DriverError>> + Send {
        (**self).query_segments(stmt)
    }
}

impl<C: SegmentClient> SegmentClient for std::sync::Arc<C> {
    fn query_segments(
        &self,
        stmt: &BoundStatement,
    ) -> impl Future<Output = Result<Vec<RowMap>, DriverError>> + Send {
        (**self).query_segments(stmt)
    }
}

// ── Recording client for tests ──
