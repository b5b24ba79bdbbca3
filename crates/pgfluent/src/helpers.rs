//! One-call helpers over plain field maps and raw SQL.
//!
//! These reuse the builder's compile/execute path, so they share its validation, logging and
//! error classification.

use crate::builder::QueryBuilder;
use crate::client::SegmentClient;
use crate::database::Database;
use crate::error::DbResult;
use crate::query::{CompiledQuery, StatementKind};
use crate::value::{RowMap, Value};

/// Insert one row into `table` and return the stored row.
pub async fn insert<C: SegmentClient>(
    db: &Database<C>,
    table: &str,
    row: RowMap,
) -> DbResult<Option<RowMap>> {
    db.table(table).insert(row).await
}

/// Update rows of `table` matching every `filter` entry by equality.
///
/// An empty `filter` fails with `MISSING_WHERE_CLAUSE`.
pub async fn update<C: SegmentClient>(
    db: &Database<C>,
    table: &str,
    row: RowMap,
    filter: RowMap,
) -> DbResult<Option<RowMap>> {
    matching(db.table(table), filter).update(row).await
}

/// Delete rows of `table` matching every `filter` entry by equality; returns the deleted rows.
///
/// An empty `filter` fails with `MISSING_WHERE_CLAUSE`.
pub async fn remove<C: SegmentClient>(
    db: &Database<C>,
    table: &str,
    filter: RowMap,
) -> DbResult<Vec<RowMap>> {
    matching(db.table(table), filter).delete().await
}

/// Run caller-supplied SQL with `$n` placeholders.
///
/// ```ignore
/// let rows = pgfluent::query(&db, "SELECT count(*) AS n FROM videos WHERE level = $1", &["beginner".into()]).await?;
/// ```
pub async fn query<C: SegmentClient>(
    db: &Database<C>,
    sql: &str,
    params: &[Value],
) -> DbResult<Vec<RowMap>> {
    db.run(StatementKind::Raw, &CompiledQuery::new(sql, params.to_vec()))
        .await
}

fn matching<'a, C: SegmentClient>(
    builder: QueryBuilder<'a, C>,
    filter: RowMap,
) -> QueryBuilder<'a, C> {
    filter
        .into_iter()
        .fold(builder, |b, (column, value)| b.eq(column, value))
}
