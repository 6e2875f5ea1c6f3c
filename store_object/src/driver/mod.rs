//! SQL execution capability
//!
//! A driver receives one finished statement and returns rows as JSON records.
//! The repository always inlines every value before calling a driver, so
//! implementations may ignore `values`.

pub mod memory;
pub mod postgres;

use crate::errors::DriverError;
use async_trait::async_trait;
use serde_json::{Map, Value};

pub use memory::MemoryDriver;
pub use postgres::{PgPoolDriver, RawSqlDriver};

/// One result row keyed by column name, in column order
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRows {
    pub rows: Vec<Record>,
}

impl SqlRows {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }
}

#[async_trait]
pub trait SqlDriver: Send + Sync {
    async fn execute_sql(&self, sql: &str, values: &[Value]) -> Result<SqlRows, DriverError>;
}
