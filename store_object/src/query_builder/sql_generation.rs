//! Clause builders
//!
//! Pure functions from descriptors to SQL fragments. WHERE predicates allocate
//! `$N` placeholders depth-first, left to right, across the whole tree.

use crate::query_builder::filter::{QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::ordering::OrderBy;
use serde_json::Value;
use type_mapping::{quote_identifier, render_column_list};

pub struct SqlGenerator;

impl SqlGenerator {
    /// Build the WHERE predicate (without the keyword) and its values.
    ///
    /// Top-level filters are joined with AND. An empty list yields an empty
    /// predicate, in which case the caller omits `WHERE` entirely.
    pub fn build_where_clause(filters: &[QueryFilter]) -> (String, Vec<Value>) {
        let mut values = Vec::new();

        let predicate = filters
            .iter()
            .map(|filter| Self::build_filter_sql(filter, &mut values))
            .filter(|sql| !sql.is_empty())
            .collect::<Vec<_>>()
            .join(" AND ");

        (predicate, values)
    }

    fn build_filter_sql(filter: &QueryFilter, values: &mut Vec<Value>) -> String {
        match filter {
            QueryFilter::Condition(condition) => Self::build_condition_sql(condition, values),
            QueryFilter::Group { operator, filters } => {
                let separator = format!(" {} ", operator.to_sql());

                let children = filters
                    .iter()
                    .map(|f| Self::build_filter_sql(f, values))
                    .filter(|sql| !sql.is_empty())
                    .collect::<Vec<_>>();

                if children.is_empty() {
                    String::new()
                } else {
                    format!("({})", children.join(&separator))
                }
            }
        }
    }

    fn build_condition_sql(condition: &QueryCondition, values: &mut Vec<Value>) -> String {
        values.push(condition.value.clone());
        let field = quote_identifier(&condition.field);
        let param = values.len();

        match condition.operator {
            QueryOperator::Any => format!("{} = ANY(${})", field, param),
            operator => format!("{} {} ${}", field, operator.to_sql(), param),
        }
    }

    /// Build `ORDER BY "key" DIR, ...`, or an empty string for no ordering
    pub fn build_order_clause(order_by: &[OrderBy]) -> String {
        if order_by.is_empty() {
            return String::new();
        }

        let order_items: Vec<String> = order_by
            .iter()
            .map(|order| format!("{} {}", quote_identifier(&order.key), order.direction.to_sql()))
            .collect();

        format!("ORDER BY {}", order_items.join(", "))
    }

    /// Build `LIMIT n OFFSET m`; zero values are omitted
    pub fn build_limit_clause(limit: u64, offset: u64) -> String {
        let mut clauses = Vec::new();

        if limit > 0 {
            clauses.push(format!("LIMIT {}", limit));
        }

        if offset > 0 {
            clauses.push(format!("OFFSET {}", offset));
        }

        clauses.join(" ")
    }

    /// Build the selected or returned column list, `*` when empty
    pub fn build_select_clause(columns: &[String]) -> String {
        render_column_list(columns)
    }
}
