use crate::DbError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{LedgerItem, NewItem};
use sqlx::postgres::PgPool;

/// The storage port for ledger items.
///
/// Handlers and commands only ever see this trait, so the PostgreSQL store
/// and the in-memory store can be swapped freely.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Stores a new item, assigning its id and timestamps.
    async fn create(&self, item: &NewItem) -> Result<LedgerItem, DbError>;

    /// Fetches one item, or `DbError::NotFound`.
    async fn get(&self, id: i64) -> Result<LedgerItem, DbError>;

    /// Lists items dated within the optional inclusive bounds, newest first.
    async fn list(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<LedgerItem>, DbError>;

    /// Replaces every client-owned field of an item, or `DbError::NotFound`.
    async fn update(&self, id: i64, item: &NewItem) -> Result<LedgerItem, DbError>;

    /// Removes an item, or `DbError::NotFound`.
    async fn delete(&self, id: i64) -> Result<(), DbError>;

    /// The snapshot the analytics aggregation runs over.
    async fn items_in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<LedgerItem>, DbError> {
        self.list(Some(from), Some(to)).await
    }
}

const ITEM_COLUMNS: &str = "id, type, amount, category, date, created_at, updated_at";

/// The PostgreSQL-backed `ItemRepository`. It encapsulates all SQL queries
/// and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository for DbRepository {
    async fn create(&self, item: &NewItem) -> Result<LedgerItem, DbError> {
        let query = format!(
            r#"
            INSERT INTO items (type, amount, category, date)
            VALUES ($1, $2, $3, $4)
            RETURNING {ITEM_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, LedgerItem>(&query)
            .bind(item.kind)
            .bind(item.amount)
            .bind(&item.category)
            .bind(item.date)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(id = created.id, "Inserted item.");
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<LedgerItem, DbError> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1");
        sqlx::query_as::<_, LedgerItem>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)
    }

    async fn list(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<LedgerItem>, DbError> {
        let query = format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM items
            WHERE ($1::timestamptz IS NULL OR date >= $1)
              AND ($2::timestamptz IS NULL OR date <= $2)
            ORDER BY date DESC, id DESC
            "#
        );
        let items = sqlx::query_as::<_, LedgerItem>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn update(&self, id: i64, item: &NewItem) -> Result<LedgerItem, DbError> {
        let query = format!(
            r#"
            UPDATE items
            SET type = $1, amount = $2, category = $3, date = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {ITEM_COLUMNS}
            "#
        );
        sqlx::query_as::<_, LedgerItem>(&query)
            .bind(item.kind)
            .bind(item.amount)
            .bind(&item.category)
            .bind(item.date)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
