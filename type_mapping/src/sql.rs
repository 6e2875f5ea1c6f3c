//! SQL literal formatting
//!
//! This module turns JSON values into inline PostgreSQL literals and
//! materializes `$N` placeholders into a fully literal statement.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstitutionError {
    #[error("Placeholder ${index} has no value ({provided} values provided)")]
    PlaceholderOutOfRange { index: usize, provided: usize },

    #[error("Invalid placeholder: ${0}")]
    InvalidPlaceholder(String),
}

/// Single-quote a string, doubling every embedded quote.
pub fn quote_literal(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    quoted.push_str(&text.replace('\'', "''"));
    quoted.push('\'');
    quoted
}

/// Format a value as an inline SQL literal.
///
/// | value            | literal                 |
/// |------------------|-------------------------|
/// | `null`           | `NULL`                  |
/// | number           | `3`, `1.5`              |
/// | boolean          | `TRUE` / `FALSE`        |
/// | string           | `'it''s'`               |
/// | empty array      | `'{}'`                  |
/// | array            | `ARRAY[1,2]`            |
/// | object           | `JSONB '{"a":1}'`       |
///
/// The empty array renders as a text-array literal so it can be assigned to
/// columns defaulting to an empty array.
pub fn format_sql_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => quote_literal(text),
        Value::Array(items) if items.is_empty() => "'{}'".to_string(),
        Value::Array(items) => {
            let elements = items
                .iter()
                .map(format_sql_value)
                .collect::<Vec<_>>()
                .join(",");
            format!("ARRAY[{}]", elements)
        }
        Value::Object(_) => format!("JSONB {}", quote_literal(&value.to_string())),
    }
}

/// Replace every `$N` placeholder with the literal of `values[N - 1]`.
///
/// Placeholders inside single-quoted literals or double-quoted identifiers are
/// left alone, so text already inlined by the SET builder is never rewritten.
/// Bare words must not contain quote characters; column names that would are
/// quoted by `target_column`.
pub fn substitute_placeholders(sql: &str, values: &[Value]) -> Result<String, SubstitutionError> {
    let mut output = String::with_capacity(sql.len() + values.len() * 8);
    let mut chars = sql.chars().peekable();
    let mut in_literal = false;
    let mut in_identifier = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_identifier => in_literal = !in_literal,
            '"' if !in_literal => in_identifier = !in_identifier,
            '$' if !in_literal && !in_identifier => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }

                if digits.is_empty() {
                    output.push('$');
                    continue;
                }

                let index: usize = digits
                    .parse()
                    .map_err(|_| SubstitutionError::InvalidPlaceholder(digits.clone()))?;
                let value = index
                    .checked_sub(1)
                    .and_then(|position| values.get(position))
                    .ok_or(SubstitutionError::PlaceholderOutOfRange {
                        index,
                        provided: values.len(),
                    })?;

                output.push_str(&format_sql_value(value));
                continue;
            }
            _ => {}
        }
        output.push(c);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_scalars() {
        assert_eq!(format_sql_value(&Value::Null), "NULL");
        assert_eq!(format_sql_value(&json!(true)), "TRUE");
        assert_eq!(format_sql_value(&json!(false)), "FALSE");
        assert_eq!(format_sql_value(&json!(3)), "3");
        assert_eq!(format_sql_value(&json!(-42)), "-42");
        assert_eq!(format_sql_value(&json!(1.5)), "1.5");
    }

    #[test]
    fn test_format_string_escapes_quotes() {
        assert_eq!(format_sql_value(&json!("it's")), "'it''s'");
        assert_eq!(format_sql_value(&json!("")), "''");
        assert_eq!(
            format_sql_value(&json!("'; DROP TABLE users; --")),
            "'''; DROP TABLE users; --'"
        );
    }

    #[test]
    fn test_format_arrays() {
        assert_eq!(format_sql_value(&json!([])), "'{}'");
        assert_eq!(format_sql_value(&json!([1, 2])), "ARRAY[1,2]");
        assert_eq!(
            format_sql_value(&json!(["openid", "profile"])),
            "ARRAY['openid','profile']"
        );
    }

    #[test]
    fn test_format_object_as_jsonb() {
        assert_eq!(format_sql_value(&json!({"a": 1})), "JSONB '{\"a\":1}'");
        assert_eq!(
            format_sql_value(&json!({"name": "it's"})),
            "JSONB '{\"name\":\"it''s\"}'"
        );
    }

    #[test]
    fn test_substitute_in_order() {
        let sql = "SELECT * FROM clients WHERE \"id\" = $1 AND \"name\" = $2;";
        let result = substitute_placeholders(sql, &[json!("abc"), json!("it's")]).unwrap();
        assert_eq!(
            result,
            "SELECT * FROM clients WHERE \"id\" = 'abc' AND \"name\" = 'it''s';"
        );
    }

    #[test]
    fn test_substitute_multi_digit_placeholders() {
        let values: Vec<Value> = (1..=12).map(|i| json!(i)).collect();
        let result = substitute_placeholders("$1 $10 $12", &values).unwrap();
        assert_eq!(result, "1 10 12");
    }

    #[test]
    fn test_substitute_skips_quoted_text() {
        let sql = "UPDATE t SET note = 'costs $1' WHERE \"a$1\" = $1;";
        let result = substitute_placeholders(sql, &[json!(7)]).unwrap();
        assert_eq!(result, "UPDATE t SET note = 'costs $1' WHERE \"a$1\" = 7;");
    }

    #[test]
    fn test_substitute_handles_escaped_quotes() {
        let sql = "SET note = 'it''s $1' WHERE x = $1";
        let result = substitute_placeholders(sql, &[json!(true)]).unwrap();
        assert_eq!(result, "SET note = 'it''s $1' WHERE x = TRUE");
    }

    #[test]
    fn test_substitute_missing_value() {
        let err = substitute_placeholders("x = $2", &[json!(1)]).unwrap_err();
        assert_eq!(
            err,
            SubstitutionError::PlaceholderOutOfRange {
                index: 2,
                provided: 1
            }
        );

        let err = substitute_placeholders("x = $0", &[json!(1)]).unwrap_err();
        assert!(matches!(err, SubstitutionError::PlaceholderOutOfRange { index: 0, .. }));
    }

    #[test]
    fn test_substitute_lone_dollar() {
        let result = substitute_placeholders("SELECT '$' || $ AS x", &[]).unwrap();
        assert_eq!(result, "SELECT '$' || $ AS x");
    }
}
