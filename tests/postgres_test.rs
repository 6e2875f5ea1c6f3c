//! Integration tests against a live PostgreSQL
//!
//! Run with `DATABASE_URL` set and `--ignored`. Each test works in its own
//! scratch table and drops it afterwards.

use identety::prelude::*;
use serde_json::json;
use std::sync::Arc;

async fn setup_pool() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database")
}

async fn create_table(pool: &PgPool, name: &str) {
    let _ = sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", name))
        .execute(pool)
        .await;
    sqlx::query(&format!(
        "CREATE TABLE {} (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL,
            settings JSONB NOT NULL DEFAULT '{{}}',
            scopes TEXT[] NOT NULL DEFAULT '{{}}',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP NOT NULL DEFAULT now()
        )",
        name
    ))
    .execute(pool)
    .await
    .expect("Failed to create table");
}

async fn drop_table(pool: &PgPool, name: &str) {
    let _ = sqlx::query(&format!("DROP TABLE IF EXISTS {} CASCADE", name))
        .execute(pool)
        .await;
}

fn repository(pool: &PgPool, table: &str, raw: bool) -> PersistentRepository<Record> {
    let driver: Arc<dyn SqlDriver> = if raw {
        Arc::new(RawSqlDriver::new(pool.clone()))
    } else {
        Arc::new(PgPoolDriver::new(pool.clone()))
    };
    PersistentRepository::new(Arc::new(TableSchema::new(table).unwrap()), driver)
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
async fn test_crud_round_trip() {
    let pool = setup_pool().await;
    create_table(&pool, "identety_crud_test").await;
    let repo = repository(&pool, "identety_crud_test", false);

    let created = repo
        .create_one(&json!({
            "name": "it's quoted",
            "settings": {"theme": "dark", "note": "it's"},
            "scopes": ["openid", "profile"]
        }))
        .await
        .unwrap();
    assert_eq!(created["name"], json!("it's quoted"));
    assert_eq!(created["settings"]["note"], json!("it's"));
    assert_eq!(created["scopes"], json!(["openid", "profile"]));
    assert_eq!(created["is_active"], json!(true));

    let found = repo
        .find_one(vec![QueryFilter::eq("id", created["id"].clone())])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, created);

    let updated = repo
        .update_one(
            &FilterSpec::new().filter(QueryFilter::eq("id", created["id"].clone())),
            &json!({"isActive": false, "scopes": []}),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated["is_active"], json!(false));
    assert_eq!(updated["scopes"], json!([]));

    let deleted = repo.delete_rows(&FilterSpec::new()).await.unwrap();
    assert_eq!(deleted.len(), 1);

    drop_table(&pool, "identety_crud_test").await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
async fn test_pagination_with_raw_driver() {
    let pool = setup_pool().await;
    create_table(&pool, "identety_page_test").await;
    let repo = repository(&pool, "identety_page_test", true);

    let payloads: Vec<_> = (0..25).map(|i| json!({"name": format!("n{:02}", i)})).collect();
    repo.create_many(&payloads).await.unwrap();

    let page = repo
        .find_all_with_pagination(
            &PaginationRequest::new()
                .page(3)
                .limit(10)
                .order_by("name", SortOrder::Asc),
        )
        .await
        .unwrap();

    assert_eq!(page.nodes.len(), 5);
    assert_eq!(page.nodes[0]["name"], json!("n20"));
    assert_eq!(page.meta.total_count, 25);
    assert_eq!(page.meta.total_pages, 3);
    assert!(!page.meta.has_next_page);

    drop_table(&pool, "identety_page_test").await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL pointing at a PostgreSQL instance"]
async fn test_driver_errors_propagate() {
    let pool = setup_pool().await;
    let repo = repository(&pool, "identety_missing_table", false);

    let error = repo.find_rows(&FindRowsRequest::new()).await.unwrap_err();
    match error {
        PersistenceError::Driver { table, operation, source } => {
            assert_eq!(table, "identety_missing_table");
            assert_eq!(operation, "find_rows");
            assert!(matches!(source, DriverError::Sqlx(_)));
        }
        other => panic!("expected driver error, got {:?}", other),
    }
}
