use crate::driver::Record;
use serde_json::Value;
use type_mapping::{format_sql_value, target_column};

/// Ordered column assignments for an UPDATE
///
/// Values are inlined as literals when rendered; they never travel through
/// the positional parameter list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSet {
    assignments: Record,
}

impl UpdateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a specific value
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.assignments.insert(field.into(), value);
        self
    }

    /// Check if there are any assignments
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Render `col = literal, ...` with snake_cased column names in insertion order
    ///
    /// Columns are bare unless they need quoting, see `target_column`.
    pub fn to_sql(&self) -> String {
        self.assignments
            .iter()
            .map(|(field, value)| format!("{} = {}", target_column(field), format_sql_value(value)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<Record> for UpdateSet {
    fn from(assignments: Record) -> Self {
        Self { assignments }
    }
}
