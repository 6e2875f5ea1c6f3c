//! PostgreSQL column types
//!
//! The subset of PostgreSQL types a row can be decoded from into JSON, and
//! the type names used when describing table schemas.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Uuid,
    Text,
    Varchar,
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Json,
    Jsonb,
    Timestamp,
    TimestampTz,
    Date,
    TextArray,
    VarcharArray,
    UuidArray,
}

impl ColumnKind {
    /// Map a PostgreSQL type name (as reported by the server) to a column kind
    pub fn from_pg_type(type_name: &str) -> Option<Self> {
        let kind = match type_name.trim().to_ascii_uppercase().as_str() {
            "UUID" => Self::Uuid,
            "TEXT" | "NAME" | "BPCHAR" | "CHAR" => Self::Text,
            "VARCHAR" | "CHARACTER VARYING" => Self::Varchar,
            "BOOL" | "BOOLEAN" => Self::Boolean,
            "INT2" | "SMALLINT" => Self::SmallInt,
            "INT4" | "INTEGER" | "INT" => Self::Integer,
            "INT8" | "BIGINT" => Self::BigInt,
            "FLOAT4" | "REAL" => Self::Real,
            "FLOAT8" | "DOUBLE PRECISION" => Self::Double,
            "JSON" => Self::Json,
            "JSONB" => Self::Jsonb,
            "TIMESTAMP" => Self::Timestamp,
            "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => Self::TimestampTz,
            "DATE" => Self::Date,
            "TEXT[]" | "_TEXT" => Self::TextArray,
            "VARCHAR[]" | "_VARCHAR" => Self::VarcharArray,
            "UUID[]" | "_UUID" => Self::UuidArray,
            _ => return None,
        };
        Some(kind)
    }

    /// PostgreSQL type name used in schema descriptions
    pub fn pg_type(&self) -> &'static str {
        match self {
            Self::Uuid => "UUID",
            Self::Text => "TEXT",
            Self::Varchar => "VARCHAR",
            Self::Boolean => "BOOLEAN",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Real => "REAL",
            Self::Double => "DOUBLE PRECISION",
            Self::Json => "JSON",
            Self::Jsonb => "JSONB",
            Self::Timestamp => "TIMESTAMP",
            Self::TimestampTz => "TIMESTAMP WITH TIME ZONE",
            Self::Date => "DATE",
            Self::TextArray => "TEXT[]",
            Self::VarcharArray => "VARCHAR[]",
            Self::UuidArray => "UUID[]",
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::TextArray | Self::VarcharArray | Self::UuidArray)
    }
}
