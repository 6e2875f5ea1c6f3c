//! Table metadata and the table registry
//!
//! A `TableRegistry` maps table identifiers to their column metadata. It is
//! built once at startup and handed to whoever constructs repositories, so no
//! table map lives in global state.

use crate::errors::PersistenceError;
use crate::validation::{ValidatedTableName, ValidationError};
use std::collections::HashMap;
use std::sync::Arc;
use type_mapping::ColumnKind;

/// A single column of a relational table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ColumnKind,
    pub nullable: bool,
}

impl ColumnDef {
    /// Non-null column
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: ValidatedTableName,
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            name: ValidatedTableName::new(name)?,
            columns: Vec::new(),
        })
    }

    /// Append a column definition
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Look up a column by its snake_case name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Tables declared without columns accept any column
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.is_empty() || self.get_column(name).is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: HashMap<String, Arc<TableSchema>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, schema: TableSchema) -> Result<Arc<TableSchema>, PersistenceError> {
        let name = schema.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(PersistenceError::TableAlreadyRegistered(name));
        }

        let schema = Arc::new(schema);
        self.tables.insert(name, schema.clone());
        Ok(schema)
    }

    pub fn get(&self, name: &str) -> Option<Arc<TableSchema>> {
        self.tables.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Registered table names, sorted
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
