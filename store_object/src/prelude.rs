//! Convenience re-exports for common store-object usage

// Repository and drivers
pub use crate::driver::{MemoryDriver, PgPoolDriver, RawSqlDriver, Record, SqlDriver, SqlRows};
pub use crate::generic_store::PersistentRepository;

// Error types
pub use crate::errors::{DriverError, PersistenceError};

// Table metadata
pub use crate::schema::{ColumnDef, TableRegistry, TableSchema};
pub use crate::validation::{ValidatedTableName, ValidationError};
pub use type_mapping::ColumnKind;

// Query building
pub use crate::query_builder::{
    FilterSpec, FindRowsRequest, OrderBy, PaginationMeta, PaginationRequest, PaginationResponse,
    QueryFilter, QueryOperator, SortOrder, SqlStatement, UpdateSet,
};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use sqlx::PgPool;
pub use uuid::Uuid;
