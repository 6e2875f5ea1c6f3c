//! # identety
//!
//! Persistence core of the identety identity provider: a generic repository
//! that gives every entity table the same CRUD and pagination operations,
//! built on structured filter, sort and update descriptors rendered to
//! PostgreSQL text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use identety::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let identety = Identety::new(config).await?;
//!
//!     let clients = identety.repository::<Client>(DatabaseTableName::Clients)?;
//!
//!     let created = clients
//!         .create_one(&json!({
//!             "clientId": "web-app",
//!             "name": "Web App",
//!             "type": "public",
//!             "redirectUris": ["https://app.example.com/callback"],
//!         }))
//!         .await?;
//!
//!     let page = clients
//!         .find_all_with_pagination(
//!             &identety
//!                 .pagination_request()
//!                 .filter(QueryFilter::eq("is_active", json!(true)))
//!                 .order_by("created_at", SortOrder::Desc),
//!         )
//!         .await?;
//!     println!("{} of {} clients, first is {}", page.nodes.len(), page.meta.total_count, created.client_id);
//!
//!     identety.shutdown().await;
//!     Ok(())
//! }
//! ```

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

pub mod core;
pub mod entities;
pub mod errors;
pub mod prelude;
pub mod schema;

// Re-export the main public types for convenience
pub use core::Identety;
pub use errors::IdentetyError;
pub use schema::{default_registry, DatabaseTableName};

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, PaginationConfig};

// Re-export internal crates used by the public API
pub use store_object;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
