#![cfg(feature = "db-tests")]
//! Postgres-backed store tests.
//!
//! Needs a reachable database configured through the `VITRINE_DB_*`
//! variables. The schema in `sql/schema.sql` is applied on first use.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use tokio::sync::OnceCell;
use vitrine_api::{Db, DbConfig, PgStore};
use vitrine_core::{
    ListParams, NewsletterSubscription, Query, RowKey, Service, SortOrder, Table,
};
use vitrine_test_utils::{fixtures, generators};

const SCHEMA: &str = include_str!("../sql/schema.sql");

/// Applied once per test binary. Pools are built per test because each
/// `#[tokio::test]` runs on its own runtime.
static SCHEMA_APPLIED: OnceCell<()> = OnceCell::const_new();

async fn db() -> Result<Db, String> {
    let pool = DbConfig::from_env()
        .create_pool()
        .map_err(|e| e.to_string())?;
    SCHEMA_APPLIED
        .get_or_try_init(|| async {
            let conn = pool.get().await.map_err(|e| e.to_string())?;
            conn.batch_execute(SCHEMA).await.map_err(|e| e.to_string())
        })
        .await?;
    Ok(Db::new(Arc::new(PgStore::new(pool))))
}

fn unique(service: &mut Service) {
    service.id = uuid::Uuid::now_v7();
    service.slug = format!("{}-{}", service.slug, service.id.simple());
}

#[tokio::test]
async fn service_crud_cycle() -> Result<(), String> {
    let db = db().await?;
    let mut service = fixtures::service("Postgres Cycle", true);
    unique(&mut service);

    let stored = db.insert(&service).await.map_err(|e| e.to_string())?;
    assert_eq!(stored.id, service.id);
    assert_eq!(stored.features, service.features);

    let by_slug = db
        .require::<Service>(&RowKey::parse(&service.slug))
        .await
        .map_err(|e| e.to_string())?;
    assert_eq!(by_slug.id, service.id);

    let patch = json!({ "title": "Renamed" });
    let updated = db
        .update::<Service>(
            &RowKey::Id(service.id),
            patch.as_object().cloned().unwrap_or_default(),
        )
        .await
        .map_err(|e| e.to_string())?
        .ok_or("row vanished")?;
    assert_eq!(updated.title, "Renamed");
    assert!(updated.updated_at >= stored.updated_at);

    assert!(db.delete::<Service>(&RowKey::Id(service.id)).await.map_err(|e| e.to_string())?);
    assert!(db
        .get::<Service>(&RowKey::Id(service.id))
        .await
        .map_err(|e| e.to_string())?
        .is_none());
    Ok(())
}

#[tokio::test]
async fn unique_email_is_a_conflict() -> Result<(), String> {
    let db = db().await?;
    let email = format!("{}@example.com", uuid::Uuid::now_v7().simple());
    let mut first = fixtures::inactive_subscription(&email);
    first.unsubscribe_token = uuid::Uuid::now_v7().to_string();
    db.insert(&first).await.map_err(|e| e.to_string())?;

    let mut second = fixtures::inactive_subscription(&email);
    second.unsubscribe_token = uuid::Uuid::now_v7().to_string();
    let err = db
        .insert(&second)
        .await
        .err()
        .ok_or("duplicate email was accepted")?;
    assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);

    db.delete::<NewsletterSubscription>(&RowKey::Id(first.id))
        .await
        .map_err(|e| e.to_string())?;
    Ok(())
}

#[tokio::test]
async fn list_plan_filters_and_counts_in_sql() -> Result<(), String> {
    let db = db().await?;
    let category = format!("cat-{}", uuid::Uuid::now_v7().simple());
    for (i, featured) in [true, true, false].into_iter().enumerate() {
        let mut service = fixtures::service(&format!("Sql List {}", i), featured);
        unique(&mut service);
        service.category = Some(category.clone());
        db.insert(&service).await.map_err(|e| e.to_string())?;
    }

    let params = ListParams::new()
        .with("category", category.clone())
        .with("featured", "true")
        .with("limit", "1");
    let plan = vitrine_core::apply_list_params(
        Query::table(Table::Services),
        &params,
        &Service::LIST,
    );
    let listing = db.list::<Service>(&plan).await.map_err(|e| e.to_string())?;
    assert_eq!(listing.items.len(), 1);
    assert_eq!(listing.pagination.map(|p| p.total), Some(2));

    let ordered = Query::table(Table::Services)
        .eq_text("category", category)
        .order_by("title", SortOrder::Asc);
    let rows = db.select::<Service>(&ordered).await.map_err(|e| e.to_string())?;
    assert_eq!(rows.len(), 3);
    for row in rows {
        db.delete::<Service>(&RowKey::Id(row.id)).await.map_err(|e| e.to_string())?;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_service_rows_survive_storage(service in generators::arb_service()) {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        rt.block_on(async {
            let db = db().await.map_err(TestCaseError::fail)?;
            let mut service = service;
            unique(&mut service);

            let stored = db.insert(&service).await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(&stored.title, &service.title);
            prop_assert_eq!(stored.status, service.status);
            prop_assert_eq!(stored.display_order, service.display_order);

            db.delete::<Service>(&RowKey::Id(service.id)).await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            Ok(())
        })?;
    }
}
