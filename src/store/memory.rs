//! In-memory item store implementation.
//!
//! Useful for testing and throwaway runs.

use super::{Item, ItemStore, NewItem, Page};
use crate::error::{Result, TrellisError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Default)]
struct Inner {
    items: BTreeMap<i64, Item>,
    next_id: i64,
}

/// In-memory item store.
pub struct MemoryItemStore {
    inner: RwLock<Inner>,
}

impl MemoryItemStore {
    /// Create a new in-memory item store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                items: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for MemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> TrellisError {
    TrellisError::Store(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn create(&self, item: &NewItem) -> Result<Item> {
        let mut inner = self.inner.write().map_err(poisoned)?;

        let id = inner.next_id;
        inner.next_id += 1;

        let item = Item {
            id,
            name: item.name.clone(),
            description: item.description.clone(),
        };
        inner.items.insert(id, item.clone());
        Ok(item)
    }

    async fn get(&self, id: i64) -> Result<Option<Item>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.items.get(&id).cloned())
    }

    async fn list(&self, page: Page) -> Result<Vec<Item>> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner
            .items
            .values()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryItemStore::new();

        let first = store.create(&NewItem::new("one", "first")).await.unwrap();
        let second = store.create(&NewItem::new("two", "second")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        assert_eq!(store.get(2).await.unwrap(), Some(second.clone()));
        assert_eq!(store.get(3).await.unwrap(), None);

        let listed = store.list(Page::new(1, 10)).await.unwrap();
        assert_eq!(listed, vec![second]);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
