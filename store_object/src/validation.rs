//! Table name validation
//!
//! Table names are interpolated into statements unquoted, so they are
//! restricted to plain PostgreSQL identifiers.

use std::fmt;
use thiserror::Error;

/// Validation errors for database identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    Empty,

    #[error("Invalid characters in name '{0}': only alphanumeric characters and underscores are allowed")]
    InvalidCharacters(String),

    #[error("Name '{name}' is too long: {length} characters (max {max_length})")]
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },

    #[error("Name '{0}' must start with a letter or underscore")]
    InvalidStartCharacter(String),

    #[error("Name '{0}' is a reserved SQL keyword")]
    ReservedKeyword(String),
}

/// Keywords that cannot appear unquoted in table position
const RESERVED_KEYWORDS: &[&str] = &[
    "ALL", "AND", "ANY", "ARRAY", "AS", "ASC", "BOTH", "CASE", "CHECK", "COLUMN", "CONSTRAINT",
    "CREATE", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DO", "DROP", "ELSE", "END", "EXCEPT",
    "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "GRANT", "GROUP", "HAVING", "IN", "INSERT",
    "INTO", "LIMIT", "NOT", "NULL", "OFFSET", "ON", "ONLY", "OR", "ORDER", "PRIMARY",
    "REFERENCES", "RETURNING", "SELECT", "SET", "TABLE", "THEN", "TO", "TRUE", "UNION", "UNIQUE",
    "UPDATE", "USER", "USING", "VALUES", "WHEN", "WHERE", "WITH",
];

/// A validated table name that is safe to use in SQL queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedTableName(String);

impl ValidatedTableName {
    /// PostgreSQL identifier length limit
    pub const MAX_LENGTH: usize = 63;

    pub fn new(name: &str) -> Result<Self, ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::Empty);
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                name: name.to_string(),
                length: name.len(),
                max_length: Self::MAX_LENGTH,
            });
        }

        let first_char = name.chars().next().ok_or(ValidationError::Empty)?;
        if !first_char.is_ascii_alphabetic() && first_char != '_' {
            return Err(ValidationError::InvalidStartCharacter(name.to_string()));
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ValidationError::InvalidCharacters(name.to_string()));
        }

        if RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str()) {
            return Err(ValidationError::ReservedKeyword(name.to_string()));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for ValidatedTableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_table_names() {
        let valid_names = [
            "tenants",
            "clients",
            "authorization_codes",
            "CloudUsers",
            "_staging",
            "t1",
            &"a".repeat(63),
        ];

        for name in valid_names {
            assert!(
                ValidatedTableName::new(name).is_ok(),
                "Should accept valid name: {}",
                name
            );
        }
    }

    #[test]
    fn test_invalid_table_names() {
        let test_cases = [
            ("", ValidationError::Empty),
            (
                "1clients",
                ValidationError::InvalidStartCharacter("1clients".to_string()),
            ),
            (
                "role-permissions",
                ValidationError::InvalidCharacters("role-permissions".to_string()),
            ),
            (
                "clients; DROP TABLE users",
                ValidationError::InvalidCharacters("clients; DROP TABLE users".to_string()),
            ),
            ("user", ValidationError::ReservedKeyword("user".to_string())),
            ("ORDER", ValidationError::ReservedKeyword("ORDER".to_string())),
        ];

        for (name, expected_error) in test_cases {
            assert_eq!(ValidatedTableName::new(name).unwrap_err(), expected_error);
        }
    }

    #[test]
    fn test_too_long_name() {
        match ValidatedTableName::new(&"a".repeat(64)).unwrap_err() {
            ValidationError::TooLong {
                length, max_length, ..
            } => {
                assert_eq!(length, 64);
                assert_eq!(max_length, 63);
            }
            other => panic!("Expected TooLong error, got {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let table_name = ValidatedTableName::new("users").unwrap();
        assert_eq!(table_name.to_string(), "users");
        assert_eq!(table_name.as_str(), "users");
    }
}
