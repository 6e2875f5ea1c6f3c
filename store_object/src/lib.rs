//! Store Object - generic relational persistence core for identety
//!
//! This crate provides the clause builders, the `SqlDriver` execution
//! capability and the generic `PersistentRepository` that lets every entity
//! table share one CRUD and pagination implementation.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod driver;
pub mod errors;
pub mod generic_store;
pub mod prelude;
pub mod query_builder;
pub mod schema;
pub mod validation;

pub use driver::{MemoryDriver, PgPoolDriver, RawSqlDriver, Record, SqlDriver, SqlRows};
pub use errors::{DriverError, PersistenceError};
pub use generic_store::PersistentRepository;
pub use query_builder::{
    FilterSpec, FindRowsRequest, LogicalOperator, OrderBy, PaginationMeta, PaginationRequest,
    PaginationResponse, QueryCondition, QueryFilter, QueryOperator, SortOrder, SqlStatement,
    UpdateSet,
};
pub use schema::{ColumnDef, TableRegistry, TableSchema};
pub use validation::{ValidatedTableName, ValidationError};

pub use type_mapping::ColumnKind;

use sqlx::PgPool;

pub type DbPool = PgPool;
