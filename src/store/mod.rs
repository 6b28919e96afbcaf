//! Item storage for Trellis.
//!
//! Provides a trait-based interface over the `items` table so the HTTP layer
//! doesn't care whether items live in SQLite or in memory.

mod memory;
mod sqlite;

pub use memory::MemoryItemStore;
pub use sqlite::SqliteItemStore;

use crate::error::{Result, TrellisError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// A stored item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier assigned by the store.
    pub id: i64,
    /// Item name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

/// Fields required to create an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub description: String,
}

impl NewItem {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Offset pagination over items ordered by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Page {
    /// Number of items to skip.
    pub skip: u32,
    /// Maximum number of items to return.
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
        }
    }
}

impl Page {
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }

    /// Clamp `limit` to `max`.
    pub fn clamped(self, max: u32) -> Self {
        Self {
            skip: self.skip,
            limit: self.limit.min(max),
        }
    }
}

/// Trait for item store implementations.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a new item and return it with its assigned id.
    async fn create(&self, item: &NewItem) -> Result<Item>;

    /// Get an item by id.
    async fn get(&self, id: i64) -> Result<Option<Item>>;

    /// List items in id order.
    async fn list(&self, page: Page) -> Result<Vec<Item>>;

    /// Total number of stored items.
    async fn count(&self) -> Result<usize>;
}

/// Where items are kept, parsed from a database URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// SQLite database file.
    SqliteFile(PathBuf),
    /// Private in-memory SQLite database.
    SqliteMemory,
    /// Plain in-process store without SQLite.
    Memory,
}

impl StoreLocation {
    /// Parse a connection string such as `sqlite:///./test.db`.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();

        if url == "memory" {
            return Ok(StoreLocation::Memory);
        }
        if url == "sqlite::memory:" || url == "sqlite://:memory:" || url == ":memory:" {
            return Ok(StoreLocation::SqliteMemory);
        }

        // sqlite:///relative.db and sqlite:////abs/path.db follow the SQLAlchemy convention
        if let Some(rest) = url.strip_prefix("sqlite:///") {
            if rest.is_empty() {
                return Err(TrellisError::Config("Missing SQLite database path".to_string()));
            }
            return Ok(StoreLocation::SqliteFile(expand(rest)));
        }
        if let Some(rest) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) {
            if rest.is_empty() {
                return Err(TrellisError::Config("Missing SQLite database path".to_string()));
            }
            return Ok(StoreLocation::SqliteFile(expand(rest)));
        }

        Err(TrellisError::Config(format!(
            "Unsupported database URL '{}': only sqlite and memory are supported",
            url
        )))
    }
}

fn expand(path: &str) -> PathBuf {
    crate::config::Settings::expand_path(path)
}

/// Open the item store described by `url`.
pub fn open_store(url: &str) -> Result<Arc<dyn ItemStore>> {
    let store: Arc<dyn ItemStore> = match StoreLocation::parse(url)? {
        StoreLocation::SqliteFile(path) => Arc::new(SqliteItemStore::new(&path)?),
        StoreLocation::SqliteMemory => Arc::new(SqliteItemStore::in_memory()?),
        StoreLocation::Memory => Arc::new(MemoryItemStore::new()),
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sqlite_urls() {
        assert_eq!(
            StoreLocation::parse("sqlite:///./test.db").unwrap(),
            StoreLocation::SqliteFile(PathBuf::from("./test.db"))
        );
        assert_eq!(
            StoreLocation::parse("sqlite:////var/lib/trellis/items.db").unwrap(),
            StoreLocation::SqliteFile(PathBuf::from("/var/lib/trellis/items.db"))
        );
        assert_eq!(
            StoreLocation::parse("sqlite://items.db").unwrap(),
            StoreLocation::SqliteFile(PathBuf::from("items.db"))
        );
        assert_eq!(
            StoreLocation::parse("sqlite::memory:").unwrap(),
            StoreLocation::SqliteMemory
        );
        assert_eq!(StoreLocation::parse("memory").unwrap(), StoreLocation::Memory);
    }

    #[test]
    fn test_parse_unsupported_url() {
        let err = StoreLocation::parse("postgresql://user@localhost/db").unwrap_err();
        assert!(matches!(err, TrellisError::Config(_)));
        assert!(StoreLocation::parse("sqlite:///").is_err());
    }

    #[test]
    fn test_page_clamp() {
        let page = Page::new(5, 5000).clamped(1000);
        assert_eq!(page, Page::new(5, 1000));
        assert_eq!(Page::default().clamped(1000), Page::new(0, 100));
    }

    #[tokio::test]
    async fn test_open_store() {
        let store = open_store("memory").unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        let store = open_store("sqlite::memory:").unwrap();
        let item = store.create(&NewItem::new("a", "b")).await.unwrap();
        assert_eq!(item.id, 1);
    }
}
