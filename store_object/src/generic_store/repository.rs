//! CRUD and pagination operations
//!
//! Every operation builds its statement, inlines the positional values as
//! literals and sends the single resulting string to the driver. Driver errors
//! are passed through with the table and operation attached; nothing is
//! retried.

use super::core::PersistentRepository;
use crate::driver::Record;
use crate::errors::{DriverError, PersistenceError};
use crate::query_builder::{
    FilterSpec, FindRowsRequest, PaginationMeta, PaginationRequest, PaginationResponse,
    QueryFilter, SqlStatement, UpdateSet,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use type_mapping::to_snake_case;

impl<T> PersistentRepository<T>
where
    T: DeserializeOwned + Send,
{
    /// Materialize a statement and execute it, returning the raw rows
    pub async fn execute_sql(&self, statement: &SqlStatement) -> Result<Vec<Record>, PersistenceError> {
        self.run("execute_sql", statement).await
    }

    pub async fn find_rows(&self, request: &FindRowsRequest) -> Result<Vec<T>, PersistenceError> {
        let statement = self.build_find_rows(request);
        let rows = self.run("find_rows", &statement).await?;
        decode_rows(rows)
    }

    /// First matching row, if any
    pub async fn find_one(&self, filters: Vec<QueryFilter>) -> Result<Option<T>, PersistenceError> {
        let request = FindRowsRequest::new().filters(filters).limit(1);
        Ok(self.find_rows(&request).await?.into_iter().next())
    }

    pub async fn exists(&self, filters: Vec<QueryFilter>) -> Result<bool, PersistenceError> {
        Ok(self.find_row_count(&filters).await? > 0)
    }

    pub async fn find_row_count(&self, filters: &[QueryFilter]) -> Result<u64, PersistenceError> {
        let statement = self.build_count(filters);
        let rows = self.run("find_row_count", &statement).await?;

        let row = rows.first().ok_or_else(|| PersistenceError::EmptyResult {
            table: self.table_name().to_string(),
            operation: "find_row_count",
        })?;

        parse_count(row.get("count")).ok_or_else(|| {
            PersistenceError::driver(
                self.table_name(),
                "find_row_count",
                DriverError::Execution(format!("unexpected count value: {:?}", row.get("count"))),
            )
        })
    }

    /// One page of rows plus totals
    ///
    /// Rows and count are fetched by two separate statements, so the totals
    /// may disagree with the page under concurrent writes.
    pub async fn find_all_with_pagination(
        &self,
        request: &PaginationRequest,
    ) -> Result<PaginationResponse<T>, PersistenceError> {
        let nodes = self.find_rows(&request.to_find_rows()).await?;
        let total_count = self.find_row_count(&request.filters).await?;

        Ok(PaginationResponse {
            nodes,
            meta: PaginationMeta::new(
                total_count,
                request.effective_page(),
                request.effective_limit(),
            ),
        })
    }

    pub async fn create_one<P>(&self, payload: &P) -> Result<T, PersistenceError>
    where
        P: Serialize + ?Sized,
    {
        let record = self.to_record(payload)?;
        self.warn_unknown_columns(&record);

        let statement = self.build_insert(&record);
        let row = self
            .run("create_one", &statement)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PersistenceError::EmptyResult {
                table: self.table_name().to_string(),
                operation: "create_one",
            })?;

        Ok(serde_json::from_value(Value::Object(row))?)
    }

    /// Insert each payload in turn
    ///
    /// Not atomic: when an insert fails, the rows inserted before it stay
    /// committed and the error is returned.
    pub async fn create_many<P>(&self, payloads: &[P]) -> Result<Vec<T>, PersistenceError>
    where
        P: Serialize + Sync,
    {
        let mut created = Vec::with_capacity(payloads.len());
        for payload in payloads {
            created.push(self.create_one(payload).await?);
        }
        Ok(created)
    }

    /// Update matching rows and return the first one the database reports
    pub async fn update_one<P>(
        &self,
        spec: &FilterSpec,
        changes: &P,
    ) -> Result<Option<T>, PersistenceError>
    where
        P: Serialize + ?Sized,
    {
        let changes = UpdateSet::from(self.to_record(changes)?);
        let statement = self.build_update(spec, &changes);
        let rows = self.run("update_one", &statement).await?;

        rows.into_iter()
            .next()
            .map(|row| serde_json::from_value(Value::Object(row)))
            .transpose()
            .map_err(PersistenceError::from)
    }

    pub async fn delete_rows(&self, spec: &FilterSpec) -> Result<Vec<T>, PersistenceError> {
        let statement = self.build_delete(spec);
        let rows = self.run("delete_rows", &statement).await?;
        decode_rows(rows)
    }

    async fn run(
        &self,
        operation: &'static str,
        statement: &SqlStatement,
    ) -> Result<Vec<Record>, PersistenceError> {
        debug_log!(
            "[{}] table={} values={}",
            operation,
            self.table_name(),
            statement.values.len()
        );

        let sql = statement.materialize()?;
        trace_log!("[{}] sql: {}", operation, sql);

        let result = self
            .driver
            .execute_sql(&sql, &[])
            .await
            .map_err(|e| PersistenceError::driver(self.table_name(), operation, e))?;

        tracing::debug!(
            table = self.table_name(),
            operation,
            rows = result.rows.len(),
            "statement executed"
        );

        Ok(result.rows)
    }

    fn to_record<P>(&self, payload: &P) -> Result<Record, PersistenceError>
    where
        P: Serialize + ?Sized,
    {
        match serde_json::to_value(payload)? {
            Value::Object(record) => Ok(record),
            other => Err(PersistenceError::invalid_payload(
                self.table_name(),
                format!("expected an object, got {}", json_kind(&other)),
            )),
        }
    }

    fn warn_unknown_columns(&self, record: &Record) {
        for key in record.keys() {
            let column = to_snake_case(key);
            if !self.table.has_column(&column) {
                tracing::warn!(
                    table = self.table_name(),
                    column = %column,
                    "insert payload names a column the table does not declare"
                );
            }
        }
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Record>) -> Result<Vec<T>, PersistenceError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(PersistenceError::from))
        .collect()
}

/// PostgreSQL reports `COUNT(*)` as a bigint; some drivers hand it back as text
fn parse_count(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;
    use crate::query_builder::{QueryFilter, SortOrder};
    use crate::schema::{ColumnDef, TableSchema};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;
    use type_mapping::ColumnKind;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Role {
        id: String,
        name: String,
        tenant_id: Option<String>,
    }

    fn setup(table: &str) -> (Arc<MemoryDriver>, PersistentRepository<Record>) {
        let driver = Arc::new(MemoryDriver::new());
        let repo = PersistentRepository::new(Arc::new(TableSchema::new(table).unwrap()), driver.clone());
        (driver, repo)
    }

    #[tokio::test]
    async fn test_find_rows_sends_literal_sql() {
        let (driver, repo) = setup("clients");
        let request = FindRowsRequest::new()
            .filter(QueryFilter::eq("id", json!("abc")))
            .limit(1);

        let rows = repo.find_rows(&request).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(
            driver.last_statement().unwrap(),
            "SELECT * FROM clients WHERE \"id\" = 'abc' LIMIT 1;"
        );
    }

    #[tokio::test]
    async fn test_create_then_find_round_trip() {
        let (_driver, repo) = setup("clients");

        let created = repo
            .create_one(&json!({"clientId": "x", "isActive": true}))
            .await
            .unwrap();
        let id = created["id"].clone();
        assert!(id.is_string());

        let found = repo
            .find_rows(
                &FindRowsRequest::new()
                    .filter(QueryFilter::eq("id", id))
                    .limit(1),
            )
            .await
            .unwrap();

        assert_eq!(found, vec![created]);
    }

    #[tokio::test]
    async fn test_create_one_emits_snake_case_insert() {
        let (driver, repo) = setup("clients");
        repo.create_one(&json!({"clientId": "x", "isActive": true}))
            .await
            .unwrap();

        assert_eq!(
            driver.last_statement().unwrap(),
            "INSERT INTO clients (client_id, is_active) VALUES ('x', TRUE) RETURNING *;"
        );
        assert_eq!(driver.rows("clients")[0]["client_id"], json!("x"));
    }

    #[tokio::test]
    async fn test_create_one_rejects_non_object_payload() {
        let (_driver, repo) = setup("clients");
        let result = repo.create_one(&json!(["not", "an", "object"])).await;
        assert!(matches!(result, Err(PersistenceError::InvalidPayload { .. })));
    }

    #[tokio::test]
    async fn test_create_many_is_not_atomic() {
        let (driver, repo) = setup("roles");
        driver.fail_on_insert(2);

        let payloads = vec![
            json!({"name": "admin"}),
            json!({"name": "editor"}),
            json!({"name": "viewer"}),
        ];
        let result = repo.create_many(&payloads).await;

        match result {
            Err(PersistenceError::Driver { table, operation, .. }) => {
                assert_eq!(table, "roles");
                assert_eq!(operation, "create_one");
            }
            other => panic!("expected driver error, got {:?}", other),
        }

        // The first insert stays committed, the third never ran
        let rows = driver.rows("roles");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("admin"));
    }

    #[tokio::test]
    async fn test_pagination_meta() {
        let (driver, repo) = setup("users");
        for i in 0..25 {
            driver.insert_row("users", json!({"id": format!("u{:02}", i)}).as_object().unwrap().clone());
        }

        let first = repo
            .find_all_with_pagination(&PaginationRequest::new().page(1).limit(10))
            .await
            .unwrap();
        assert_eq!(first.nodes.len(), 10);
        assert_eq!(first.meta.total_count, 25);
        assert!(first.meta.has_next_page);
        assert_eq!(first.meta.total_pages, 3);

        let last = repo
            .find_all_with_pagination(
                &PaginationRequest::new()
                    .page(3)
                    .limit(10)
                    .order_by("id", SortOrder::Asc),
            )
            .await
            .unwrap();
        assert_eq!(last.nodes.len(), 5);
        assert_eq!(last.nodes[0]["id"], json!("u20"));
        assert!(!last.meta.has_next_page);
        assert_eq!(last.meta.current_page, 3);
        assert_eq!(last.meta.total_pages, 3);

        let statements = driver.statements();
        assert_eq!(
            statements[statements.len() - 2],
            "SELECT * FROM users ORDER BY \"id\" ASC LIMIT 10 OFFSET 20;"
        );
        assert_eq!(statements[statements.len() - 1], "SELECT COUNT(*) FROM users;");
    }

    #[tokio::test]
    async fn test_update_one_returns_first_row() {
        let driver = Arc::new(MemoryDriver::new());
        let schema = TableSchema::new("roles")
            .unwrap()
            .column(ColumnDef::new("id", ColumnKind::Uuid))
            .column(ColumnDef::new("name", ColumnKind::Varchar))
            .column(ColumnDef::new("tenant_id", ColumnKind::Uuid).nullable());
        let repo: PersistentRepository<Role> = PersistentRepository::new(Arc::new(schema), driver.clone());

        let created = repo
            .create_one(&json!({"id": "r1", "name": "admin", "tenantId": null}))
            .await
            .unwrap();
        assert_eq!(created.tenant_id, None);

        let spec = FilterSpec::new().filter(QueryFilter::eq("id", json!("r1")));
        let updated = repo
            .update_one(&spec, &json!({"name": "owner", "tenantId": "t1"}))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            updated,
            Role {
                id: "r1".to_string(),
                name: "owner".to_string(),
                tenant_id: Some("t1".to_string()),
            }
        );
        assert_eq!(
            driver.last_statement().unwrap(),
            "UPDATE roles SET name = 'owner', tenant_id = 't1' WHERE \"id\" = 'r1' RETURNING *;"
        );

        let missing = repo
            .update_one(
                &FilterSpec::new().filter(QueryFilter::eq("id", json!("nope"))),
                &json!({"name": "x"}),
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_delete_rows_and_exists() {
        let (driver, repo) = setup("tokens");
        repo.create_one(&json!({"id": "a", "revoked": true})).await.unwrap();
        repo.create_one(&json!({"id": "b", "revoked": false})).await.unwrap();

        let deleted = repo
            .delete_rows(
                &FilterSpec::new()
                    .filter(QueryFilter::eq("revoked", json!(true)))
                    .returning(["id"]),
            )
            .await
            .unwrap();

        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0]["id"], json!("a"));
        assert_eq!(driver.rows("tokens").len(), 1);
        assert!(!repo.exists(vec![QueryFilter::eq("id", json!("a"))]).await.unwrap());
        assert!(repo.exists(vec![QueryFilter::eq("id", json!("b"))]).await.unwrap());
        assert_eq!(
            repo.find_one(vec![QueryFilter::eq("id", json!("b"))])
                .await
                .unwrap()
                .unwrap()["revoked"],
            json!(false)
        );
    }

    #[tokio::test]
    async fn test_failed_statements_leave_rows_untouched() {
        let (driver, repo) = setup("roles");
        for name in ["admin", "admin", "viewer"] {
            repo.create_one(&json!({"name": name})).await.unwrap();
        }

        let deleted = repo
            .delete_rows(
                &FilterSpec::new()
                    .filter(QueryFilter::eq("name", json!("admin")))
                    .returning(["missing_column"]),
            )
            .await;
        assert!(deleted.unwrap_err().is_driver_error());
        assert_eq!(driver.rows("roles").len(), 3);

        let updated = repo
            .update_one(
                &FilterSpec::new().returning(["missing_column"]),
                &json!({"name": "owner"}),
            )
            .await;
        assert!(updated.unwrap_err().is_driver_error());
        assert!(driver
            .rows("roles")
            .iter()
            .all(|row| row["name"] != json!("owner")));
    }

    #[tokio::test]
    async fn test_brace_text_round_trips() {
        let (_driver, repo) = setup("tenants");

        let created = repo
            .create_one(&json!({"name": "{}", "settings": {"pattern": "{}"}}))
            .await
            .unwrap();
        assert_eq!(created["name"], json!("{}"));

        let found = repo
            .find_one(vec![QueryFilter::eq("id", created["id"].clone())])
            .await
            .unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn test_execute_sql_substitutes_placeholders() {
        let (driver, repo) = setup("roles");
        repo.create_one(&json!({"id": "r1", "name": "it's"})).await.unwrap();

        let rows = repo
            .execute_sql(&SqlStatement::new(
                "SELECT \"id\" FROM roles WHERE \"name\" = $1;",
                vec![json!("it's")],
            ))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(
            driver.last_statement().unwrap(),
            "SELECT \"id\" FROM roles WHERE \"name\" = 'it''s';"
        );
    }

    #[tokio::test]
    async fn test_execute_sql_missing_value() {
        let (_driver, repo) = setup("roles");
        let result = repo
            .execute_sql(&SqlStatement::raw("SELECT * FROM roles WHERE \"id\" = $1;"))
            .await;
        assert!(matches!(result, Err(PersistenceError::Substitution(_))));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(Some(&json!(7))), Some(7));
        assert_eq!(parse_count(Some(&json!("42"))), Some(42));
        assert_eq!(parse_count(Some(&json!(null))), None);
        assert_eq!(parse_count(None), None);
    }
}
