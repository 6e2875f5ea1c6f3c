//! Page-based listing
//!
//! `offset = (page - 1) * limit`, `has_next_page = page * limit < total_count`
//! and `total_pages = ceil(total_count / limit)`.

use crate::query_builder::builder::FindRowsRequest;
use crate::query_builder::filter::QueryFilter;
use crate::query_builder::ordering::{OrderBy, SortOrder};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationRequest {
    pub page: u64,
    pub limit: u64,
    pub columns: Vec<String>,
    pub filters: Vec<QueryFilter>,
    pub order_by: Vec<OrderBy>,
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            columns: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
        }
    }
}

impl PaginationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, key: &str, order: SortOrder) -> Self {
        self.order_by.push(OrderBy::new(key, order));
        self
    }

    /// Page number, with 0 treated as the first page
    pub fn effective_page(&self) -> u64 {
        self.page.max(1)
    }

    /// Page size, with 0 treated as the default
    pub fn effective_limit(&self) -> u64 {
        if self.limit == 0 {
            DEFAULT_LIMIT
        } else {
            self.limit
        }
    }

    /// Rows skipped before this page, saturating for absurd page numbers
    pub fn offset(&self) -> u64 {
        (self.effective_page() - 1).saturating_mul(self.effective_limit())
    }

    /// The row window for this page
    pub fn to_find_rows(&self) -> FindRowsRequest {
        FindRowsRequest {
            columns: self.columns.clone(),
            filters: self.filters.clone(),
            order_by: self.order_by.clone(),
            limit: Some(self.effective_limit()),
            offset: Some(self.offset()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total_count: u64,
    pub current_page: u64,
    pub has_next_page: bool,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(total_count: u64, current_page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total_count.div_ceil(limit)
        };

        Self {
            total_count,
            current_page,
            has_next_page: current_page.saturating_mul(limit) < total_count,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationResponse<T> {
    pub nodes: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> PaginationResponse<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PaginationResponse<U> {
        PaginationResponse {
            nodes: self.nodes.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
