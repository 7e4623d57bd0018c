//! Runs against a live PostgreSQL named by `DATABASE_URL`:
//! `cargo test -p database -- --ignored`.

use chrono::{Duration, TimeZone, Utc};
use core_types::{ItemKind, NewItem};
use database::{connect, run_migrations, DbError, DbRepository, ItemRepository};
use rust_decimal_macros::dec;

async fn repository() -> DbRepository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
    let config = configuration::DatabaseConfig {
        url: Some(url),
        host: String::new(),
        port: 5432,
        user: String::new(),
        password: String::new(),
        name: String::new(),
        max_connections: 2,
        acquire_timeout: std::time::Duration::from_secs(5),
    };
    let pool = connect(&config).await.unwrap();
    run_migrations(&pool).await.unwrap();
    DbRepository::new(pool)
}

#[tokio::test]
#[ignore = "needs a PostgreSQL instance"]
async fn crud_round_trip() {
    let repo = repository().await;
    // Far-future dates keep this test's rows apart from any existing data.
    let date = Utc.with_ymd_and_hms(2199, 6, 1, 8, 0, 0).unwrap();

    let created = repo
        .create(&NewItem::new(ItemKind::Expense, dec!(42.10), "Books", date))
        .await
        .unwrap();
    assert_eq!(created.amount, dec!(42.10));
    assert_eq!(created.kind, ItemKind::Expense);

    let fetched = repo.get(created.id).await.unwrap();
    assert_eq!(fetched, created);

    let in_range = repo
        .items_in_range(date - Duration::minutes(1), date + Duration::minutes(1))
        .await
        .unwrap();
    assert!(in_range.iter().any(|i| i.id == created.id));

    let updated = repo
        .update(created.id, &NewItem::new(ItemKind::Income, dec!(50), "Refund", date))
        .await
        .unwrap();
    assert_eq!(updated.kind, ItemKind::Income);
    assert_eq!(updated.created_at, created.created_at);

    repo.delete(created.id).await.unwrap();
    assert!(matches!(repo.get(created.id).await, Err(DbError::NotFound)));
    assert!(matches!(repo.delete(created.id).await, Err(DbError::NotFound)));
}
