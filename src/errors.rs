//! Error types for the identety crate
//!
//! This module contains all error types that can be returned by identety operations.

use std::fmt::Display;
use store_object::PersistenceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentetyError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Table not registered: {0}")]
    TableNotRegistered(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IdentetyError {
    /// Wrap any failure as a generic bad-input error
    pub fn bad_request(error: impl Display) -> Self {
        Self::BadRequest(error.to_string())
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }
}
