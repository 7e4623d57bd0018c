use crate::repository::ItemRepository;
use crate::DbError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{LedgerItem, NewItem};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// A process-local `ItemRepository`. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    last_id: i64,
    items: BTreeMap<i64, LedgerItem>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemRepository for InMemoryRepository {
    async fn create(&self, item: &NewItem) -> Result<LedgerItem, DbError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let created = LedgerItem::from_new(state.last_id, item.clone(), Utc::now());
        state.items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<LedgerItem, DbError> {
        let state = self.state.read().await;
        state.items.get(&id).cloned().ok_or(DbError::NotFound)
    }

    async fn list(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<LedgerItem>, DbError> {
        let state = self.state.read().await;
        let mut items: Vec<LedgerItem> = state
            .items
            .values()
            .filter(|item| from.is_none_or(|from| item.date >= from))
            .filter(|item| to.is_none_or(|to| item.date <= to))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn update(&self, id: i64, item: &NewItem) -> Result<LedgerItem, DbError> {
        let mut state = self.state.write().await;
        let stored = state.items.get_mut(&id).ok_or(DbError::NotFound)?;
        stored.apply(item.clone(), Utc::now());
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DbError> {
        let mut state = self.state.write().await;
        state.items.remove(&id).map(|_| ()).ok_or(DbError::NotFound)
    }
}
