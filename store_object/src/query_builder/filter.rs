//! Filter trees
//!
//! A filter is either a single comparison or an AND/OR group of filters.
//! Serialized, a comparison is `{ "key", "operator", "value" }` and a group is
//! `{ "and": [...] }` or `{ "or": [...] }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operators a condition can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=", alias = "<>")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "LIKE", alias = "like")]
    Like,
    #[serde(rename = "ILIKE", alias = "ilike")]
    ILike,
    #[serde(rename = "NOT LIKE", alias = "not like")]
    NotLike,
    #[serde(rename = "IS", alias = "is")]
    Is,
    #[serde(rename = "IS NOT", alias = "is not")]
    IsNot,
    /// `= ANY($N)`, value is an array
    #[serde(rename = "= ANY", alias = "any")]
    Any,
    /// `@>`, array contains
    #[serde(rename = "@>")]
    ArrayContains,
    /// `&&`, array overlap
    #[serde(rename = "&&")]
    ArrayOverlap,
}

impl QueryOperator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            QueryOperator::Eq => "=",
            QueryOperator::Ne => "!=",
            QueryOperator::Gt => ">",
            QueryOperator::Gte => ">=",
            QueryOperator::Lt => "<",
            QueryOperator::Lte => "<=",
            QueryOperator::Like => "LIKE",
            QueryOperator::ILike => "ILIKE",
            QueryOperator::NotLike => "NOT LIKE",
            QueryOperator::Is => "IS",
            QueryOperator::IsNot => "IS NOT",
            QueryOperator::Any => "= ANY",
            QueryOperator::ArrayContains => "@>",
            QueryOperator::ArrayOverlap => "&&",
        }
    }
}

/// Single comparison in a WHERE clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCondition {
    #[serde(rename = "key")]
    pub field: String,
    pub operator: QueryOperator,
    pub value: Value,
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// Query filter that can be nested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FilterRepr", into = "FilterRepr")]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FilterRepr {
    Or { or: Vec<QueryFilter> },
    And { and: Vec<QueryFilter> },
    Condition(QueryCondition),
}

impl From<FilterRepr> for QueryFilter {
    fn from(repr: FilterRepr) -> Self {
        match repr {
            FilterRepr::Or { or } => QueryFilter::or(or),
            FilterRepr::And { and } => QueryFilter::and(and),
            FilterRepr::Condition(condition) => QueryFilter::Condition(condition),
        }
    }
}

impl From<QueryFilter> for FilterRepr {
    fn from(filter: QueryFilter) -> Self {
        match filter {
            QueryFilter::Condition(condition) => FilterRepr::Condition(condition),
            QueryFilter::Group {
                operator: LogicalOperator::And,
                filters,
            } => FilterRepr::And { and: filters },
            QueryFilter::Group {
                operator: LogicalOperator::Or,
                filters,
            } => FilterRepr::Or { or: filters },
        }
    }
}

impl QueryFilter {
    /// Create a simple condition
    pub fn condition(field: &str, operator: QueryOperator, value: Value) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    /// Create AND group
    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    /// Create OR group
    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    pub fn eq(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Eq, value)
    }

    pub fn ne(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Ne, value)
    }

    pub fn gt(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Gt, value)
    }

    pub fn gte(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Gte, value)
    }

    pub fn lt(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Lt, value)
    }

    pub fn lte(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Lte, value)
    }

    pub fn like(field: &str, pattern: &str) -> Self {
        Self::condition(field, QueryOperator::Like, Value::String(pattern.to_string()))
    }

    pub fn ilike(field: &str, pattern: &str) -> Self {
        Self::condition(field, QueryOperator::ILike, Value::String(pattern.to_string()))
    }

    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::Is, Value::Null)
    }

    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNot, Value::Null)
    }

    /// Column equals any element of `values`
    pub fn any_of(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::Any, Value::Array(values))
    }

    /// Array column contains every element of `values`
    pub fn contains_all(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::ArrayContains, Value::Array(values))
    }

    /// Array column shares at least one element with `values`
    pub fn overlaps(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::ArrayOverlap, Value::Array(values))
    }
}
