//! Core identety functionality
//!
//! This module contains the `Identety` coordinator: it opens the connection
//! pool once at startup, owns the table registry and hands out typed
//! repositories sharing one driver. Closing the pool is its only teardown
//! obligation.

use serde::de::DeserializeOwned;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use store_object::{PaginationRequest, PersistentRepository, PgPoolDriver, SqlDriver, TableRegistry};

use crate::errors::IdentetyError;
use crate::schema::default_registry;
use config::{AppConfig, PaginationConfig};

/// Main coordinator that manages the database driver and table registry
pub struct Identety {
    pool: Option<PgPool>,
    driver: Arc<dyn SqlDriver>,
    registry: Arc<TableRegistry>,
    pagination: PaginationConfig,
}

impl std::fmt::Debug for Identety {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identety")
            .field("has_pool", &self.pool.is_some())
            .field("tables", &self.registry.table_names())
            .field("pagination", &self.pagination)
            .finish()
    }
}

impl Identety {
    /// Connect to PostgreSQL and register the identity-provider tables
    pub async fn new(config: AppConfig) -> Result<Self, IdentetyError> {
        let database = &config.database;
        let connection_string = database.connection_string();

        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(database.max_connections)
            .min_connections(database.min_connections)
            .acquire_timeout(Duration::from_secs(database.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(database.idle_timeout_seconds));

        // Set max lifetime if specified
        if database.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(database.max_lifetime_seconds));
        }

        debug_log!(
            "Connecting pool: min={} max={}",
            database.min_connections,
            database.max_connections
        );
        let pool = pool_options.connect(&connection_string).await?;
        tracing::info!(max_connections = database.max_connections, "database pool opened");

        Ok(Self {
            driver: Arc::new(PgPoolDriver::new(pool.clone())),
            pool: Some(pool),
            registry: Arc::new(default_registry()?),
            pagination: config.pagination,
        })
    }

    /// Build a coordinator around an existing driver, e.g. `MemoryDriver` in tests
    pub fn with_driver(driver: Arc<dyn SqlDriver>, registry: TableRegistry) -> Self {
        Self {
            pool: None,
            driver,
            registry: Arc::new(registry),
            pagination: PaginationConfig::default(),
        }
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Get database pool reference, if this coordinator opened one
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    pub fn driver(&self) -> &Arc<dyn SqlDriver> {
        &self.driver
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    /// Typed repository for a registered table
    pub fn repository<T>(&self, table: impl AsRef<str>) -> Result<PersistentRepository<T>, IdentetyError>
    where
        T: DeserializeOwned + Send,
    {
        let table = table.as_ref();
        let schema = self
            .registry
            .get(table)
            .ok_or_else(|| IdentetyError::TableNotRegistered(table.to_string()))?;

        Ok(PersistentRepository::new(schema, self.driver.clone()))
    }

    /// First page using the configured page size
    pub fn pagination_request(&self) -> PaginationRequest {
        PaginationRequest::new().limit(self.pagination.default_limit)
    }

    /// Check database connection health
    ///
    /// Coordinators built around an injected driver have no pool to probe and
    /// always report healthy.
    pub async fn health_check(&self) -> Result<(), IdentetyError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").fetch_one(pool).await?;
        }
        Ok(())
    }

    /// Close the pool, waiting for in-flight statements to finish
    pub async fn shutdown(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
            tracing::info!("database pool closed");
        }
    }
}
