use super::QueryBuilder;
use crate::client::SegmentClient;
use crate::condition::Condition;
use crate::error::{DbError, DbResult};
use crate::ident::Ident;
use crate::query::CompiledQuery;
use crate::value::{RowMap, Value};

impl<C: SegmentClient> QueryBuilder<'_, C> {
    fn check(&self) -> DbResult<&Ident> {
        if let Some(msg) = &self.build_error {
            return Err(DbError::invalid(msg.clone()));
        }
        self.table
            .as_ref()
            .ok_or_else(|| DbError::invalid("missing table name"))
    }

    fn require_conditions(&self, table: &Ident, verb: &str) -> DbResult<()> {
        if self.conditions.is_empty() {
            return Err(DbError::missing_where(format!(
                "refusing to {verb} {} without a WHERE condition",
                table.to_sql()
            )));
        }
        Ok(())
    }

    /// Compile the SELECT this builder describes.
    pub fn compile_select(&self) -> DbResult<CompiledQuery> {
        let table = self.check()?;
        let mut sql = String::from("SELECT ");
        if self.projection.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.projection.join(", "));
        }
        sql.push_str(" FROM ");
        table.write_sql(&mut sql);

        let mut values = Vec::new();
        write_where(&mut sql, &self.conditions, &mut values);

        if let Some(order) = &self.order {
            sql.push_str(" ORDER BY ");
            order.column.write_sql(&mut sql);
            sql.push_str(if order.ascending { " ASC" } else { " DESC" });
        }
        if let Some(limit) = self.limit {
            values.push(Value::Int(limit));
            sql.push_str(&format!(" LIMIT ${}", values.len()));
        }
        if let Some(offset) = self.offset {
            values.push(Value::Int(offset));
            sql.push_str(&format!(" OFFSET ${}", values.len()));
        }
        Ok(CompiledQuery::new(sql, values))
    }

    /// Compile `INSERT ... RETURNING *` for `row`. Conditions are ignored.
    pub fn compile_insert(&self, row: &RowMap) -> DbResult<CompiledQuery> {
        let table = self.check()?;
        let mut sql = String::from("INSERT INTO ");
        table.write_sql(&mut sql);

        if row.is_empty() {
            sql.push_str(" DEFAULT VALUES RETURNING *");
            return Ok(CompiledQuery::new(sql, Vec::new()));
        }

        let mut values = Vec::with_capacity(row.len());
        let mut placeholders = String::new();
        sql.push_str(" (");
        for (i, (column, value)) in row.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
                placeholders.push_str(", ");
            }
            Ident::parse(column)?.write_sql(&mut sql);
            values.push(value.clone().into_write_param());
            placeholders.push_str(&format!("${}", values.len()));
        }
        sql.push_str(") VALUES (");
        sql.push_str(&placeholders);
        sql.push_str(") RETURNING *");
        Ok(CompiledQuery::new(sql, values))
    }

    /// Compile `UPDATE ... SET ... WHERE ... RETURNING *` for `row`.
    pub fn compile_update(&self, row: &RowMap) -> DbResult<CompiledQuery> {
        let table = self.check()?;
        self.require_conditions(table, "UPDATE")?;
        if row.is_empty() {
            return Err(DbError::invalid(format!(
                "UPDATE {} has no columns to set",
                table.to_sql()
            )));
        }

        let mut sql = String::from("UPDATE ");
        table.write_sql(&mut sql);
        sql.push_str(" SET ");
        let mut values = Vec::with_capacity(row.len() + self.conditions.len());
        for (i, (column, value)) in row.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            Ident::parse(column)?.write_sql(&mut sql);
            values.push(value.clone().into_write_param());
            sql.push_str(&format!(" = ${}", values.len()));
        }
        write_where(&mut sql, &self.conditions, &mut values);
        sql.push_str(" RETURNING *");
        Ok(CompiledQuery::new(sql, values))
    }

    /// Compile `DELETE ... WHERE ... RETURNING *`.
    pub fn compile_delete(&self) -> DbResult<CompiledQuery> {
        let table = self.check()?;
        self.require_conditions(table, "DELETE FROM")?;

        let mut sql = String::from("DELETE FROM ");
        table.write_sql(&mut sql);
        let mut values = Vec::new();
        write_where(&mut sql, &self.conditions, &mut values);
        sql.push_str(" RETURNING *");
        Ok(CompiledQuery::new(sql, values))
    }
}

fn write_where(sql: &mut String, conditions: &[Condition], values: &mut Vec<Value>) {
    for (i, condition) in conditions.iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        condition.write_sql(sql, values);
    }
}
