//! Query builder utilities
//!
//! Structured filter, sort, update and pagination descriptors, and the pure
//! clause builders that turn them into SQL text plus positional values.

pub mod builder;
pub mod filter;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;
pub mod statement;
pub mod update;


pub use builder::{FilterSpec, FindRowsRequest};
pub use filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use ordering::{OrderBy, SortOrder};
pub use pagination::{PaginationMeta, PaginationRequest, PaginationResponse, DEFAULT_LIMIT};
pub use sql_generation::SqlGenerator;
pub use statement::SqlStatement;
pub use update::UpdateSet;
