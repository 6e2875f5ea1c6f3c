use crate::validation::ValidationError;
use thiserror::Error;
use type_mapping::SubstitutionError;

/// Errors raised by a `SqlDriver` while executing a statement
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Unsupported type {type_name} for column {column}")]
    UnsupportedColumnType { column: String, type_name: String },

    #[error("Execution error: {0}")]
    Execution(String),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error on {table} during {operation}: {source}")]
    Driver {
        table: String,
        operation: &'static str,
        #[source]
        source: DriverError,
    },

    #[error("Placeholder substitution failed: {0}")]
    Substitution(#[from] SubstitutionError),

    #[error("Invalid payload for {table}: {message}")]
    InvalidPayload { table: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{operation} on {table} returned no rows")]
    EmptyResult {
        table: String,
        operation: &'static str,
    },

    #[error("Table already registered: {0}")]
    TableAlreadyRegistered(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl PersistenceError {
    pub fn driver(table: &str, operation: &'static str, source: DriverError) -> Self {
        Self::Driver {
            table: table.to_string(),
            operation,
            source,
        }
    }

    pub fn invalid_payload(table: &str, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            table: table.to_string(),
            message: message.into(),
        }
    }

    /// True when the error came from the database rather than from building the statement
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }
}
