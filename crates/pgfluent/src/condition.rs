//! Query condition types.
//!
//! This module provides [`Op`] (comparison operator) and [`Condition`], the closed set of
//! predicates a builder can carry. Conditions validate their column identifiers on
//! construction and render themselves into SQL with `$n` placeholders, pushing their values
//! onto a shared value list so the placeholder index always equals the value position.

use crate::error::{DbError, DbResult};
use crate::ident::{Ident, IntoIdent};
use crate::value::Value;

/// Comparison operator for single-value conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Equal: column = value
    Eq,
    /// Not equal: column != value
    Ne,
    /// Greater than: column > value
    Gt,
    /// Greater than or equal: column >= value
    Gte,
    /// Less than: column < value
    Lt,
    /// Less than or equal: column <= value
    Lte,
    /// LIKE pattern match
    Like,
    /// Case-insensitive LIKE (PostgreSQL ILIKE)
    Ilike,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Like => "LIKE",
            Op::Ilike => "ILIKE",
        }
    }
}

/// Operators accepted inside an `or()` expression.
pub const OR_OPERATORS: &[&str] = &["eq", "ilike"];

/// One predicate (or OR-group of predicates) of a WHERE clause.
///
/// Conditions are immutable values: builders append them and never modify them afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column <op> $n`
    Compare { column: Ident, op: Op, value: Value },
    /// `column IN ($n, $n+1, ...)`, never empty
    In { column: Ident, values: Vec<Value> },
    /// The array column has an element equal to `value`, ignoring case.
    ContainsCaseInsensitive { column: Ident, value: Value },
    /// Parenthesized disjunction of sub-conditions, never empty
    Or(Vec<Condition>),
}

impl Condition {
    /// Create a comparison condition.
    pub fn compare<I, V>(column: I, op: Op, value: V) -> DbResult<Self>
    where
        I: IntoIdent,
        V: Into<Value>,
    {
        Ok(Condition::Compare {
            column: column.into_ident()?,
            op,
            value: value.into(),
        })
    }

    /// Create an equality condition: column = value
    pub fn eq<I: IntoIdent, V: Into<Value>>(column: I, value: V) -> DbResult<Self> {
        Self::compare(column, Op::Eq, value)
    }

    /// Create an inequality condition: column != value
    pub fn neq<I: IntoIdent, V: Into<Value>>(column: I, value: V) -> DbResult<Self> {
        Self::compare(column, Op::Ne, value)
    }

    /// Create a greater-than condition: column > value
    pub fn gt<I: IntoIdent, V: Into<Value>>(column: I, value: V) -> DbResult<Self> {
        Self::compare(column, Op::Gt, value)
    }

    /// Create a greater-than-or-equal condition: column >= value
    pub fn gte<I: IntoIdent, V: Into<Value>>(column: I, value: V) -> DbResult<Self> {
        Self::compare(column, Op::Gte, value)
    }

    /// Create a less-than condition: column < value
    pub fn lt<I: IntoIdent, V: Into<Value>>(column: I, value: V) -> DbResult<Self> {
        Self::compare(column, Op::Lt, value)
    }

    /// Create a less-than-or-equal condition: column <= value
    pub fn lte<I: IntoIdent, V: Into<Value>>(column: I, value: V) -> DbResult<Self> {
        Self::compare(column, Op::Lte, value)
    }

    /// Create a LIKE condition: column LIKE pattern
    pub fn like<I: IntoIdent, V: Into<Value>>(column: I, pattern: V) -> DbResult<Self> {
        Self::compare(column, Op::Like, pattern)
    }

    /// Create a case-insensitive ILIKE condition: column ILIKE pattern
    pub fn ilike<I: IntoIdent, V: Into<Value>>(column: I, pattern: V) -> DbResult<Self> {
        Self::compare(column, Op::Ilike, pattern)
    }

    /// Create an IN condition: column IN (values...)
    ///
    /// An empty list is rejected: `IN ()` is not valid SQL and silently turning it into
    /// "match nothing" hides caller bugs.
    pub fn in_list<I, V>(column: I, values: impl IntoIterator<Item = V>) -> DbResult<Self>
    where
        I: IntoIdent,
        V: Into<Value>,
    {
        let column = column.into_ident()?;
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(DbError::invalid(format!(
                "IN list for column {} must not be empty",
                column.to_sql()
            )));
        }
        Ok(Condition::In { column, values })
    }

    /// The array column contains an element equal to `value`, ignoring case.
    pub fn contains_case_insensitive<I, V>(column: I, value: V) -> DbResult<Self>
    where
        I: IntoIdent,
        V: Into<Value>,
    {
        Ok(Condition::ContainsCaseInsensitive {
            column: column.into_ident()?,
            value: value.into(),
        })
    }

    /// Group already-built conditions into a disjunction.
    pub fn any_of(conditions: Vec<Condition>) -> DbResult<Self> {
        if conditions.is_empty() {
            return Err(DbError::invalid("OR group must contain at least one condition"));
        }
        Ok(Condition::Or(conditions))
    }

    /// Parse a compact OR expression: comma-separated `field.operator.value` triples.
    ///
    /// Supported operators are listed in [`OR_OPERATORS`]; an omitted operator means `eq`.
    /// `ilike` values are wrapped as `%value%` (existing leading/trailing `%` are not doubled).
    /// Everything after the second dot belongs to the value, so `url.eq.a.b` compares with `a.b`.
    ///
    /// ```ignore
    /// let c = Condition::or("title.ilike.%core%,description.ilike.core")?;
    /// ```
    pub fn or(expr: &str) -> DbResult<Self> {
        let mut conditions = Vec::new();
        for part in expr.split(',') {
            let mut pieces = part.splitn(3, '.');
            let field = pieces.next().unwrap_or_default().trim();
            let operator = pieces.next().map(str::trim).unwrap_or("eq");
            let value = pieces.next().unwrap_or_default();

            let condition = match operator {
                "" | "eq" => Self::eq(field, value)?,
                "ilike" => {
                    let inner = value.strip_prefix('%').unwrap_or(value);
                    let inner = inner.strip_suffix('%').unwrap_or(inner);
                    Self::ilike(field, format!("%{inner}%"))?
                }
                other => {
                    return Err(DbError::invalid(format!(
                        "unsupported operator {other:?} in OR expression {expr:?} (supported: {})",
                        OR_OPERATORS.join(", ")
                    )));
                }
            };
            conditions.push(condition);
        }
        Self::any_of(conditions)
    }

    /// SQL operator keyword of this condition.
    pub fn operator(&self) -> &'static str {
        match self {
            Condition::Compare { op, .. } => op.as_sql(),
            Condition::In { .. } => "IN",
            Condition::ContainsCaseInsensitive { .. } => "ANY",
            Condition::Or(_) => "OR",
        }
    }

    /// Number of bound values this condition contributes.
    pub fn param_count(&self) -> usize {
        match self {
            Condition::Compare { .. } | Condition::ContainsCaseInsensitive { .. } => 1,
            Condition::In { values, .. } => values.len(),
            Condition::Or(conditions) => conditions.iter().map(Condition::param_count).sum(),
        }
    }

    /// Render the SQL fragment, pushing bound values onto `values`.
    ///
    /// Placeholders continue from `values.len()`, so fragments can be appended after any
    /// previously bound values (e.g. the SET list of an UPDATE).
    pub fn build(&self, values: &mut Vec<Value>) -> String {
        let mut sql = String::new();
        self.write_sql(&mut sql, values);
        sql
    }

    pub(crate) fn write_sql(&self, sql: &mut String, values: &mut Vec<Value>) {
        match self {
            Condition::Compare { column, op, value } => {
                column.write_sql(sql);
                sql.push(' ');
                sql.push_str(op.as_sql());
                sql.push(' ');
                push_placeholder(sql, values, value.clone());
            }
            Condition::In { column, values: list } => {
                column.write_sql(sql);
                sql.push_str(" IN (");
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(", ");
                    }
                    push_placeholder(sql, values, v.clone());
                }
                sql.push(')');
            }
            Condition::ContainsCaseInsensitive { column, value } => {
                sql.push_str("EXISTS (SELECT 1 FROM unnest(");
                column.write_sql(sql);
                sql.push_str(") AS elem WHERE lower(elem) = lower(");
                push_placeholder(sql, values, value.clone());
                sql.push_str("))");
            }
            Condition::Or(conditions) => {
                sql.push('(');
                for (i, c) in conditions.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" OR ");
                    }
                    c.write_sql(sql, values);
                }
                sql.push(')');
            }
        }
    }
}

fn push_placeholder(sql: &mut String, values: &mut Vec<Value>, value: Value) {
    values.push(value);
    sql.push('$');
    sql.push_str(&values.len().to_string());
}
