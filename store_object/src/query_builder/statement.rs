use serde_json::Value;
use type_mapping::{substitute_placeholders, SubstitutionError};

/// SQL text with `$N` placeholders and the values they stand for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// Statement without placeholders
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Inline every value as an escaped literal, producing one opaque statement
    pub fn materialize(&self) -> Result<String, SubstitutionError> {
        substitute_placeholders(&self.sql, &self.values)
    }
}
