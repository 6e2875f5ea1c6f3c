//! Request descriptors
//!
//! `FindRowsRequest` describes a SELECT, `FilterSpec` the WHERE and RETURNING
//! halves of an UPDATE or DELETE.

use crate::query_builder::filter::QueryFilter;
use crate::query_builder::ordering::{OrderBy, SortOrder};
use serde::{Deserialize, Serialize};

/// Row selection: columns, filters, ordering and an optional window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindRowsRequest {
    pub columns: Vec<String>,
    pub filters: Vec<QueryFilter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FindRowsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter condition
    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add multiple filters (combined with AND)
    pub fn filters(mut self, filters: Vec<QueryFilter>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Restrict the selected columns; field names are snake_cased when rendered
    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, key: &str, order: SortOrder) -> Self {
        self.order_by.push(OrderBy::new(key, order));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Filters plus the columns to return, for UPDATE and DELETE
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub filters: Vec<QueryFilter>,
    pub columns: Vec<String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn returning<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

impl From<Vec<QueryFilter>> for FilterSpec {
    fn from(filters: Vec<QueryFilter>) -> Self {
        Self {
            filters,
            columns: Vec::new(),
        }
    }
}
