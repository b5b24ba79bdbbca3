//! Decoding driver rows into [`RowMap`]s.

use crate::error::DriverError;
use crate::value::{RowMap, Value, is_text_type};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::error::Error;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Kind, Type};

/// Fallback decoder for text-like types (text, varchar, name, citext, enums), whose binary
/// form is UTF-8.
///
/// Other types without a dedicated decoder (`interval`, `inet`, `money`, ...) have no textual
/// binary form and fail to decode; cast them in the query (`"col"::text`).
struct LossyText(String);

impl<'a> FromSql<'a> for LossyText {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        if !is_text_type(ty) {
            return Err(format!("no decoder for type {ty}; cast the column to text").into());
        }
        Ok(LossyText(String::from_utf8_lossy(raw).into_owned()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

impl From<LossyText> for Value {
    fn from(v: LossyText) -> Self {
        Value::Text(v.0)
    }
}

struct Bytea(Vec<u8>);

impl<'a> FromSql<'a> for Bytea {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Vec::<u8>::from_sql(ty, raw).map(Bytea)
    }

    fn accepts(ty: &Type) -> bool {
        <Vec<u8> as FromSql>::accepts(ty)
    }
}

impl From<Bytea> for Value {
    fn from(v: Bytea) -> Self {
        Value::Text(bytea_hex(&v.0))
    }
}

struct Timestamp(NaiveDateTime);

impl<'a> FromSql<'a> for Timestamp {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        NaiveDateTime::from_sql(ty, raw).map(Timestamp)
    }

    fn accepts(ty: &Type) -> bool {
        <NaiveDateTime as FromSql>::accepts(ty)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Value::Text(format_timestamp(v.0))
    }
}

/// Convert every column of a driver row into a [`RowMap`] keyed by column name.
pub fn row_to_map(row: &Row) -> Result<RowMap, DriverError> {
    let mut map = RowMap::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_()).map_err(|e| {
            DriverError::new(format!(
                "failed to decode column {:?} ({}): {e}",
                column.name(),
                column.type_()
            ))
            .conversion()
        })?;
        map.insert(column.name().to_string(), value);
    }
    Ok(map)
}

macro_rules! get {
    ($row:expr, $idx:expr, $t:ty) => {
        Value::from($row.try_get::<_, Option<$t>>($idx)?)
    };
}

fn decode_column(row: &Row, idx: usize, ty: &Type) -> Result<Value, tokio_postgres::Error> {
    if let Kind::Array(member) = ty.kind() {
        return decode_array(row, idx, member);
    }
    let value = match *ty {
        Type::BOOL => get!(row, idx, bool),
        Type::INT2 => get!(row, idx, i16),
        Type::INT4 => get!(row, idx, i32),
        Type::INT8 => get!(row, idx, i64),
        Type::OID => get!(row, idx, u32),
        Type::FLOAT4 => get!(row, idx, f32),
        Type::FLOAT8 => get!(row, idx, f64),
        Type::NUMERIC => get!(row, idx, Decimal),
        Type::JSON | Type::JSONB => get!(row, idx, serde_json::Value),
        Type::TIMESTAMPTZ => get!(row, idx, DateTime<Utc>),
        Type::TIMESTAMP => get!(row, idx, Timestamp),
        Type::DATE => get!(row, idx, NaiveDate),
        Type::UUID => get!(row, idx, uuid::Uuid),
        Type::BYTEA => get!(row, idx, Bytea),
        _ => get!(row, idx, LossyText),
    };
    Ok(value)
}

fn decode_array(row: &Row, idx: usize, member: &Type) -> Result<Value, tokio_postgres::Error> {
    let value = match *member {
        Type::BOOL => get!(row, idx, Vec<Option<bool>>),
        Type::INT2 => get!(row, idx, Vec<Option<i16>>),
        Type::INT4 => get!(row, idx, Vec<Option<i32>>),
        Type::INT8 => get!(row, idx, Vec<Option<i64>>),
        Type::FLOAT4 => get!(row, idx, Vec<Option<f32>>),
        Type::FLOAT8 => get!(row, idx, Vec<Option<f64>>),
        Type::NUMERIC => get!(row, idx, Vec<Option<Decimal>>),
        Type::JSON | Type::JSONB => get!(row, idx, Vec<Option<serde_json::Value>>),
        Type::TIMESTAMPTZ => get!(row, idx, Vec<Option<DateTime<Utc>>>),
        Type::TIMESTAMP => get!(row, idx, Vec<Option<Timestamp>>),
        Type::DATE => get!(row, idx, Vec<Option<NaiveDate>>),
        Type::UUID => get!(row, idx, Vec<Option<uuid::Uuid>>),
        Type::BYTEA => get!(row, idx, Vec<Option<Bytea>>),
        _ => get!(row, idx, Vec<Option<LossyText>>),
    };
    Ok(value)
}

/// Postgres `bytea` hex output format: `\x` followed by lowercase hex digits.
pub(crate) fn bytea_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Timestamps without zone render ISO-8601 with millisecond precision and no offset.
pub(crate) fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}
