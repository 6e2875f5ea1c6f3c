//! Convenience re-exports for common identety usage
//!
//! # Example
//!
//! ```rust
//! use identety::prelude::*;
//!
//! let filter = QueryFilter::eq("client_id", serde_json::json!("web-app"));
//! let request = FindRowsRequest::new().filter(filter).limit(1);
//! assert_eq!(request.limit, Some(1));
//! ```

// Core identety components
pub use crate::core::Identety;
pub use crate::entities::{Client, ClientType, NewClient, NewRole, NewTenant, NewUser, Role, Tenant, User};
pub use crate::errors::IdentetyError;
pub use crate::schema::{default_registry, DatabaseTableName};

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, PaginationConfig};

// Re-export commonly used store-object types for convenience
pub use store_object::prelude::*;

// Common external dependencies
pub use async_trait;
pub use sqlx;
pub use tokio;
