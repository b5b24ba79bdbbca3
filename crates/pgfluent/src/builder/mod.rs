//! Fluent, single-use query builder.
//!
//! A [`QueryBuilder`] is obtained from [`Database::table`], accumulates a projection,
//! conditions, ordering and pagination through chained calls, and is consumed by exactly one
//! terminal call (`execute`, `single`, `insert`, `update`, `delete`).
//!
//! ## Design
//!
//! - Every identifier goes through [`Ident`], so every identifier in generated SQL is
//!   double-quoted.
//! - Values are never interpolated; `LIMIT`/`OFFSET` are bound too.
//! - Chained calls never fail. The first invalid input is remembered and returned by the
//!   terminal call before any I/O happens.
//! - UPDATE and DELETE refuse to run without at least one condition.
//!
//! ```ignore
//! let rows = db
//!     .table("videos")
//!     .select("id, title, \"createdAt\"")
//!     .eq("isPublished", true)
//!     .or("title.ilike.core,description.ilike.core")
//!     .order("createdAt", false)
//!     .range(0, 49)
//!     .execute()
//!     .await?;
//! ```

mod compile;

#[cfg(test)]
mod tests;

use crate::client::SegmentClient;
use crate::condition::{Condition, Op};
use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::ident::{Ident, IntoIdent};
use crate::query::StatementKind;
use crate::value::{RowMap, Value};

/// `ORDER BY` column and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub column: Ident,
    pub ascending: bool,
}

/// Chainable query state for one table. See the [module docs](self).
#[must_use = "a query builder does nothing until a terminal method is awaited"]
pub struct QueryBuilder<'a, C> {
    db: &'a Database<C>,
    /// Target table (None only when the name failed validation)
    table: Option<Ident>,
    /// Rendered projection columns; empty means `*`
    projection: Vec<String>,
    /// AND-joined conditions, in call order
    conditions: Vec<Condition>,
    order: Option<OrderSpec>,
    limit: Option<i64>,
    offset: Option<i64>,
    /// First validation error, reported by the terminal call
    build_error: Option<String>,
}

impl<'a, C: SegmentClient> QueryBuilder<'a, C> {
    pub(crate) fn new(db: &'a Database<C>, table: &str) -> Self {
        let mut builder = Self {
            db,
            table: None,
            projection: Vec::new(),
            conditions: Vec::new(),
            order: None,
            limit: None,
            offset: None,
            build_error: None,
        };
        match Ident::parse(table) {
            Ok(ident) => builder.table = Some(ident),
            Err(e) => builder.fail(e),
        }
        builder
    }

    fn fail(&mut self, err: DbError) {
        if self.build_error.is_none() {
            self.build_error = Some(match err {
                DbError::InvalidQuery(msg) => msg,
                other => other.to_string(),
            });
        }
    }

    fn push(mut self, condition: DbResult<Condition>) -> Self {
        match condition {
            Ok(c) => self.conditions.push(c),
            Err(e) => self.fail(e),
        }
        self
    }

    // ==================== Projection ====================

    /// Set the projection.
    ///
    /// `*` is used verbatim. Otherwise each comma-separated column is quoted individually;
    /// columns that are already double-quoted are kept as written.
    pub fn select(mut self, columns: &str) -> Self {
        let columns = columns.trim();
        if columns == "*" {
            self.projection.clear();
            return self;
        }
        let mut rendered = Vec::new();
        for column in columns.split(',').map(str::trim) {
            if column == "*" {
                rendered.push("*".to_string());
                continue;
            }
            match Ident::parse(column) {
                Ok(ident) => rendered.push(ident.to_sql()),
                Err(e) => {
                    self.fail(e);
                    return self;
                }
            }
        }
        self.projection = rendered;
        self
    }

    // ==================== Conditions ====================

    /// Append a prebuilt condition.
    pub fn filter(self, condition: Condition) -> Self {
        self.push(Ok(condition))
    }

    /// `column = value`
    pub fn eq(self, column: impl IntoIdent, value: impl Into<Value>) -> Self {
        self.push(Condition::compare(column, Op::Eq, value))
    }

    /// `column != value`
    pub fn neq(self, column: impl IntoIdent, value: impl Into<Value>) -> Self {
        self.push(Condition::compare(column, Op::Ne, value))
    }

    /// `column > value`
    pub fn gt(self, column: impl IntoIdent, value: impl Into<Value>) -> Self {
        self.push(Condition::compare(column, Op::Gt, value))
    }

    /// `column >= value`
    pub fn gte(self, column: impl IntoIdent, value: impl Into<Value>) -> Self {
        self.push(Condition::compare(column, Op::Gte, value))
    }

    /// `column < value`
    pub fn lt(self, column: impl IntoIdent, value: impl Into<Value>) -> Self {
        self.push(Condition::compare(column, Op::Lt, value))
    }

    /// `column <= value`
    pub fn lte(self, column: impl IntoIdent, value: impl Into<Value>) -> Self {
        self.push(Condition::compare(column, Op::Lte, value))
    }

    /// `column LIKE pattern`
    pub fn like(self, column: impl IntoIdent, pattern: impl Into<Value>) -> Self {
        self.push(Condition::compare(column, Op::Like, pattern))
    }

    /// `column ILIKE pattern`
    pub fn ilike(self, column: impl IntoIdent, pattern: impl Into<Value>) -> Self {
        self.push(Condition::compare(column, Op::Ilike, pattern))
    }

    /// `column IN (values...)`. An empty list fails with `INVALID_QUERY`.
    pub fn in_list<V: Into<Value>>(
        self,
        column: impl IntoIdent,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.push(Condition::in_list(column, values))
    }

    /// The array `column` has an element equal to `value`, ignoring case.
    pub fn contains_case_insensitive(
        self,
        column: impl IntoIdent,
        value: impl Into<Value>,
    ) -> Self {
        self.push(Condition::contains_case_insensitive(column, value))
    }

    /// Append one OR group parsed from `field.op.value` triples (see [`Condition::or`]).
    pub fn or(self, expr: &str) -> Self {
        self.push(Condition::or(expr))
    }

    // ==================== Order & pagination ====================

    /// Set the sort order, replacing any previous one.
    pub fn order(mut self, column: impl IntoIdent, ascending: bool) -> Self {
        match column.into_ident() {
            Ok(column) => self.order = Some(OrderSpec { column, ascending }),
            Err(e) => self.fail(e),
        }
        self
    }

    /// Inclusive row range: `offset = start`, `limit = end - start + 1`.
    pub fn range(mut self, start: usize, end: usize) -> Self {
        if end < start {
            self.fail(DbError::invalid(format!(
                "range end ({end}) is before range start ({start})"
            )));
            return self;
        }
        let Some(count) = (end - start).checked_add(1) else {
            self.fail(DbError::invalid(format!(
                "range {start}..={end} has more rows than LIMIT can express"
            )));
            return self;
        };
        self.offset = self.bound_param(start);
        self.limit = self.bound_param(count);
        self
    }

    /// Set `LIMIT`. Overrides an earlier `range`.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = self.bound_param(n);
        self
    }

    /// Set `OFFSET`. Overrides an earlier `range`.
    pub fn offset(mut self, n: usize) -> Self {
        self.offset = self.bound_param(n);
        self
    }

    fn bound_param(&mut self, n: usize) -> Option<i64> {
        match i64::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                self.fail(DbError::invalid(format!("{n} is too large for LIMIT/OFFSET")));
                None
            }
        }
    }

    // ==================== Terminals ====================

    /// Run the SELECT and return every row.
    pub async fn execute(self) -> DbResult<Vec<RowMap>> {
        let compiled = self.compile_select()?;
        self.db.run(StatementKind::Select, &compiled).await
    }

    /// Run the SELECT and return the first row, or `PGRST116` when there is none.
    pub async fn single(self) -> DbResult<RowMap> {
        self.execute()
            .await?
            .into_iter()
            .next()
            .ok_or(DbError::NoRows)
    }

    /// Insert `row` and return the stored row.
    pub async fn insert(self, row: RowMap) -> DbResult<Option<RowMap>> {
        let compiled = self.compile_insert(&row)?;
        let rows = self.db.run(StatementKind::Insert, &compiled).await?;
        Ok(rows.into_iter().next())
    }

    /// Update matching rows with `row` and return the first updated row.
    ///
    /// Fails with `MISSING_WHERE_CLAUSE` (without contacting the database) when no condition
    /// was added.
    pub async fn update(self, row: RowMap) -> DbResult<Option<RowMap>> {
        let compiled = self.compile_update(&row)?;
        let rows = self.db.run(StatementKind::Update, &compiled).await?;
        Ok(rows.into_iter().next())
    }

    /// Delete matching rows and return all of them.
    ///
    /// Fails with `MISSING_WHERE_CLAUSE` when no condition was added.
    pub async fn delete(self) -> DbResult<Vec<RowMap>> {
        let compiled = self.compile_delete()?;
        self.db.run(StatementKind::Delete, &compiled).await
    }
}
