use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::EventStore;
use crate::access::Role;
use crate::models::{Event, NewEvent};
use crate::utils::error::AppError;

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<Event>,
}

/// Process-local store used when no database is configured.
#[derive(Default)]
pub struct MemoryEventStore {
    table: RwLock<Table>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, _role: Role, event: NewEvent) -> Result<Event, AppError> {
        let mut table = self.table.write().await;
        table.next_id += 1;

        let stored = Event {
            id: table.next_id,
            start_date: event.start_date,
            end_date: event.end_date,
            city: event.city,
            brand: event.brand,
            theme: event.theme,
            description: event.description,
            created_at: Utc::now(),
        };
        table.rows.push(stored.clone());

        Ok(stored)
    }

    async fn list(&self, _role: Role) -> Result<Vec<Event>, AppError> {
        Ok(self.table.read().await.rows.clone())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn candidate(city: &str) -> NewEvent {
        NewEvent {
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            city: city.to_string(),
            brand: "Acme".to_string(),
            theme: "Summer Launch".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_first_insert_gets_id_one() {
        let store = MemoryEventStore::new();
        let before = Utc::now();
        let event = store.insert(Role::Anon, candidate("Austin")).await.unwrap();

        assert_eq!(event.id, 1);
        assert!(event.created_at >= before);
        assert!(candidate("Austin").matches(&event));
    }

    #[tokio::test]
    async fn test_list_returns_rows_in_insert_order() {
        let store = MemoryEventStore::new();
        for city in ["Austin", "Denver", "Boston"] {
            store.insert(Role::Anon, candidate(city)).await.unwrap();
        }

        let rows = store.list(Role::Anon).await.unwrap();
        let cities: Vec<_> = rows.iter().map(|e| e.city.as_str()).collect();
        assert_eq!(cities, vec!["Austin", "Denver", "Boston"]);
        assert_eq!(rows.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_get_unique_ids() {
        let store = Arc::new(MemoryEventStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .insert(Role::Anon, candidate(&format!("city-{}", i)))
                    .await
                    .unwrap()
                    .id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids, (1..=32).collect::<Vec<i64>>());

        let rows = store.list(Role::Anon).await.unwrap();
        assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
    }
}
