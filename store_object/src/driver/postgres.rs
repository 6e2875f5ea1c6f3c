//! PostgreSQL drivers
//!
//! Both drivers run over a shared `PgPool` and decode rows column by column
//! into JSON. `PgPoolDriver` sends the statement unprepared through the
//! extended protocol; `RawSqlDriver` hands it to sqlx's `raw_sql` helper,
//! which uses the simple query protocol.

use super::{Record, SqlDriver, SqlRows};
use crate::errors::DriverError;
use crate::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use type_mapping::ColumnKind;
use uuid::Uuid;

/// Executes statements directly on the pool
#[derive(Debug, Clone)]
pub struct PgPoolDriver {
    pool: DbPool,
}

impl PgPoolDriver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Close the pool, waiting for checked-out connections to be returned
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SqlDriver for PgPoolDriver {
    async fn execute_sql(&self, sql: &str, _values: &[Value]) -> Result<SqlRows, DriverError> {
        // Every statement carries its own literals, so caching the prepared form is pointless
        let rows = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&self.pool)
            .await?;

        decode_rows(&rows)
    }
}

/// Delegates execution to sqlx's `raw_sql` helper
#[derive(Debug, Clone)]
pub struct RawSqlDriver {
    pool: DbPool,
}

impl RawSqlDriver {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SqlDriver for RawSqlDriver {
    async fn execute_sql(&self, sql: &str, _values: &[Value]) -> Result<SqlRows, DriverError> {
        let rows = sqlx::raw_sql(sql).fetch_all(&self.pool).await?;
        decode_rows(&rows)
    }
}

fn decode_rows(rows: &[PgRow]) -> Result<SqlRows, DriverError> {
    let rows = rows
        .iter()
        .map(decode_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SqlRows::new(rows))
}

/// Convert a row into a JSON record keyed by column name
pub fn decode_row(row: &PgRow) -> Result<Record, DriverError> {
    let mut record = Record::new();

    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.name(), column.type_info().name())?;
        record.insert(column.name().to_string(), value);
    }

    Ok(record)
}

fn decode_column(
    row: &PgRow,
    index: usize,
    column: &str,
    type_name: &str,
) -> Result<Value, DriverError> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    let kind = ColumnKind::from_pg_type(type_name).ok_or_else(|| {
        DriverError::UnsupportedColumnType {
            column: column.to_string(),
            type_name: type_name.to_string(),
        }
    })?;

    let value = match kind {
        ColumnKind::Uuid => Value::String(row.try_get::<Uuid, _>(index)?.to_string()),
        ColumnKind::Text | ColumnKind::Varchar => Value::String(row.try_get::<String, _>(index)?),
        ColumnKind::Boolean => Value::Bool(row.try_get::<bool, _>(index)?),
        ColumnKind::SmallInt => json!(row.try_get::<i16, _>(index)?),
        ColumnKind::Integer => json!(row.try_get::<i32, _>(index)?),
        ColumnKind::BigInt => json!(row.try_get::<i64, _>(index)?),
        ColumnKind::Real => json!(row.try_get::<f32, _>(index)? as f64),
        ColumnKind::Double => json!(row.try_get::<f64, _>(index)?),
        ColumnKind::Json | ColumnKind::Jsonb => row.try_get::<Value, _>(index)?,
        ColumnKind::Timestamp => json!(row.try_get::<NaiveDateTime, _>(index)?),
        ColumnKind::TimestampTz => json!(row.try_get::<DateTime<Utc>, _>(index)?),
        ColumnKind::Date => json!(row.try_get::<NaiveDate, _>(index)?),
        ColumnKind::TextArray | ColumnKind::VarcharArray => {
            json!(row.try_get::<Vec<String>, _>(index)?)
        }
        ColumnKind::UuidArray => {
            let ids = row.try_get::<Vec<Uuid>, _>(index)?;
            Value::Array(ids.iter().map(|id| Value::String(id.to_string())).collect())
        }
    };

    Ok(value)
}
