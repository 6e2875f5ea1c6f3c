//! Value and identifier mapping between the domain model and PostgreSQL
//!
//! Pure functions shared across the identety workspace: SQL literal formatting,
//! placeholder substitution, camelCase to snake_case column naming and the
//! PostgreSQL column types the drivers know how to decode.

pub mod naming;
pub mod sql;
pub mod types;

pub use naming::{quote_identifier, render_column_list, target_column, to_snake_case};
pub use sql::{format_sql_value, quote_literal, substitute_placeholders, SubstitutionError};
pub use types::ColumnKind;
