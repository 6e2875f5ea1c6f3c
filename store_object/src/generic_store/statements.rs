//! Statement assembly
//!
//! Each builder composes the clause builders into one statement with `$N`
//! placeholders and the values they stand for. Optional clauses are left out
//! entirely and parts are joined with single spaces.

use super::core::PersistentRepository;
use crate::driver::Record;
use crate::query_builder::{
    FilterSpec, FindRowsRequest, QueryFilter, SqlGenerator, SqlStatement, UpdateSet,
    DEFAULT_LIMIT,
};
use type_mapping::target_column;

fn finish(parts: Vec<String>) -> String {
    let mut sql = parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    sql.push(';');
    sql
}

fn where_part(filters: &[QueryFilter]) -> (String, Vec<serde_json::Value>) {
    let (predicate, values) = SqlGenerator::build_where_clause(filters);
    if predicate.is_empty() {
        (String::new(), values)
    } else {
        (format!("WHERE {}", predicate), values)
    }
}

impl<T> PersistentRepository<T> {
    /// `SELECT <columns> FROM <table> [WHERE] [ORDER BY] [LIMIT] [OFFSET];`
    ///
    /// An unset limit means 10 rows; an explicit limit of 0 drops the clause.
    pub fn build_find_rows(&self, request: &FindRowsRequest) -> SqlStatement {
        let (where_clause, values) = where_part(&request.filters);
        let limit = request.limit.unwrap_or(DEFAULT_LIMIT);
        let offset = request.offset.unwrap_or(0);

        let sql = finish(vec![
            format!(
                "SELECT {} FROM {}",
                SqlGenerator::build_select_clause(&request.columns),
                self.table_name()
            ),
            where_clause,
            SqlGenerator::build_order_clause(&request.order_by),
            SqlGenerator::build_limit_clause(limit, offset),
        ]);

        SqlStatement::new(sql, values)
    }

    /// `SELECT COUNT(*) FROM <table> [WHERE];`
    pub fn build_count(&self, filters: &[QueryFilter]) -> SqlStatement {
        let (where_clause, values) = where_part(filters);
        let sql = finish(vec![
            format!("SELECT COUNT(*) FROM {}", self.table_name()),
            where_clause,
        ]);

        SqlStatement::new(sql, values)
    }

    /// `INSERT INTO <table> (<columns>) VALUES ($1, ...) RETURNING *;`
    ///
    /// Columns are the snake_cased payload keys in insertion order. An empty
    /// payload inserts a row of column defaults.
    pub fn build_insert(&self, payload: &Record) -> SqlStatement {
        if payload.is_empty() {
            return SqlStatement::raw(format!(
                "INSERT INTO {} DEFAULT VALUES RETURNING *;",
                self.table_name()
            ));
        }

        let columns: Vec<String> = payload.keys().map(|key| target_column(key)).collect();
        let placeholders: Vec<String> = (1..=payload.len()).map(|i| format!("${}", i)).collect();
        let values = payload.values().cloned().collect();

        SqlStatement::new(
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING *;",
                self.table_name(),
                columns.join(", "),
                placeholders.join(", ")
            ),
            values,
        )
    }

    /// `UPDATE <table> [SET <literals>] [WHERE <placeholders>] RETURNING <columns>;`
    ///
    /// SET values are inlined here; only the WHERE values are positional.
    pub fn build_update(&self, spec: &FilterSpec, changes: &UpdateSet) -> SqlStatement {
        let (where_clause, values) = where_part(&spec.filters);
        let set_clause = if changes.is_empty() {
            String::new()
        } else {
            format!("SET {}", changes.to_sql())
        };

        let sql = finish(vec![
            format!("UPDATE {}", self.table_name()),
            set_clause,
            where_clause,
            format!("RETURNING {}", SqlGenerator::build_select_clause(&spec.columns)),
        ]);

        SqlStatement::new(sql, values)
    }

    /// `DELETE FROM <table> [WHERE] RETURNING <columns>;`
    pub fn build_delete(&self, spec: &FilterSpec) -> SqlStatement {
        let (where_clause, values) = where_part(&spec.filters);
        let sql = finish(vec![
            format!("DELETE FROM {}", self.table_name()),
            where_clause,
            format!("RETURNING {}", SqlGenerator::build_select_clause(&spec.columns)),
        ]);

        SqlStatement::new(sql, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;
    use crate::query_builder::{OrderBy, QueryFilter, SortOrder};
    use crate::schema::TableSchema;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn repository(table: &str) -> PersistentRepository<Record> {
        PersistentRepository::new(
            Arc::new(TableSchema::new(table).unwrap()),
            Arc::new(MemoryDriver::new()),
        )
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_find_by_id_with_limit() {
        let repo = repository("clients");
        let request = FindRowsRequest::new()
            .filter(QueryFilter::eq("id", json!("abc")))
            .limit(1);

        let statement = repo.build_find_rows(&request);
        assert_eq!(statement.sql, "SELECT * FROM clients WHERE \"id\" = $1 LIMIT 1;");
        assert_eq!(statement.values, vec![json!("abc")]);
    }

    #[test]
    fn test_find_rows_defaults() {
        let repo = repository("roles");
        let statement = repo.build_find_rows(&FindRowsRequest::new());
        assert_eq!(statement.sql, "SELECT * FROM roles LIMIT 10;");
        assert!(statement.values.is_empty());

        let unlimited = repo.build_find_rows(&FindRowsRequest::new().limit(0));
        assert_eq!(unlimited.sql, "SELECT * FROM roles;");
    }

    #[test]
    fn test_find_rows_every_clause() {
        let repo = repository("users");
        let request = FindRowsRequest::new()
            .columns(["id", "firstName"])
            .filter(QueryFilter::eq("tenant_id", json!("t1")))
            .filter(QueryFilter::or(vec![
                QueryFilter::eq("a", json!(1)),
                QueryFilter::eq("b", json!(2)),
            ]))
            .order_by("created_at", SortOrder::Desc)
            .limit(20)
            .offset(40);

        let statement = repo.build_find_rows(&request);
        assert_eq!(
            statement.sql,
            "SELECT \"id\", \"first_name\" FROM users WHERE \"tenant_id\" = $1 AND (\"a\" = $2 OR \"b\" = $3) \
             ORDER BY \"created_at\" DESC LIMIT 20 OFFSET 40;"
        );
        assert_eq!(statement.values, vec![json!("t1"), json!(1), json!(2)]);
    }

    #[test]
    fn test_count_statement() {
        let repo = repository("tenants");
        assert_eq!(repo.build_count(&[]).sql, "SELECT COUNT(*) FROM tenants;");

        let statement = repo.build_count(&[QueryFilter::ilike("name", "%acme%")]);
        assert_eq!(statement.sql, "SELECT COUNT(*) FROM tenants WHERE \"name\" ILIKE $1;");
        assert_eq!(statement.values, vec![json!("%acme%")]);
    }

    #[test]
    fn test_insert_preserves_key_order() {
        let repo = repository("clients");
        let statement = repo.build_insert(&record(json!({"clientId": "x", "isActive": true})));

        assert_eq!(
            statement.sql,
            "INSERT INTO clients (client_id, is_active) VALUES ($1, $2) RETURNING *;"
        );
        assert_eq!(statement.values, vec![json!("x"), json!(true)]);
    }

    #[test]
    fn test_insert_empty_payload() {
        let repo = repository("tenants");
        let statement = repo.build_insert(&Record::new());
        assert_eq!(statement.sql, "INSERT INTO tenants DEFAULT VALUES RETURNING *;");
    }

    #[test]
    fn test_update_inlines_set_values() {
        let repo = repository("roles");
        let spec = FilterSpec::new()
            .filter(QueryFilter::eq("id", json!("r1")))
            .returning(["id", "name"]);
        let changes = UpdateSet::new()
            .set("name", json!("it's"))
            .set("permissionIds", json!([]));

        let statement = repo.build_update(&spec, &changes);
        assert_eq!(
            statement.sql,
            "UPDATE roles SET name = 'it''s', permission_ids = '{}' WHERE \"id\" = $1 RETURNING \"id\", \"name\";"
        );
        assert_eq!(statement.values, vec![json!("r1")]);
    }

    #[test]
    fn test_update_quotes_unusual_set_keys() {
        let repo = repository("roles");
        let spec = FilterSpec::new().filter(QueryFilter::eq("id", json!("r1")));
        let changes = UpdateSet::new()
            .set("it's", json!("$1"))
            .set("name", json!("x"));

        let sql = repo.build_update(&spec, &changes).materialize().unwrap();
        assert_eq!(
            sql,
            "UPDATE roles SET \"it's\" = '$1', name = 'x' WHERE \"id\" = 'r1' RETURNING *;"
        );
    }

    #[test]
    fn test_update_without_changes_or_filters() {
        let repo = repository("roles");
        let statement = repo.build_update(&FilterSpec::new(), &UpdateSet::new());
        assert_eq!(statement.sql, "UPDATE roles RETURNING *;");
    }

    #[test]
    fn test_delete_statement() {
        let repo = repository("tokens");
        let spec = FilterSpec::from(vec![QueryFilter::lt("expires_at", json!("2024-01-01"))]);

        let statement = repo.build_delete(&spec);
        assert_eq!(
            statement.sql,
            "DELETE FROM tokens WHERE \"expires_at\" < $1 RETURNING *;"
        );
        assert_eq!(statement.values, vec![json!("2024-01-01")]);
    }

    #[test]
    fn test_order_without_filters() {
        let repo = repository("roles");
        let request = FindRowsRequest {
            order_by: vec![OrderBy::asc("name"), OrderBy::desc("id")],
            ..Default::default()
        };
        assert_eq!(
            repo.build_find_rows(&request).sql,
            "SELECT * FROM roles ORDER BY \"name\" ASC, \"id\" DESC LIMIT 10;"
        );
    }
}
