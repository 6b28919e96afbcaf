//! SQLite-based item store implementation.

use super::{Item, ItemStore, NewItem, Page};
use crate::error::{Result, TrellisError};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_name ON items(name);
"#;

/// SQLite-based item store.
pub struct SqliteItemStore {
    conn: Mutex<Connection>,
}

impl SqliteItemStore {
    /// Open (or create) an item store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite item store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite item store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TrellisError::Store(format!("Failed to acquire lock: {}", e)))
    }

    fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
        Ok(Item {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    #[instrument(skip(self, item), fields(name = %item.name))]
    async fn create(&self, item: &NewItem) -> Result<Item> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO items (name, description) VALUES (?1, ?2)",
            params![item.name, item.description],
        )?;
        let id = conn.last_insert_rowid();

        debug!("Created item {}", id);
        Ok(Item {
            id,
            name: item.name.clone(),
            description: item.description.clone(),
        })
    }

    #[instrument(skip(self))]
    async fn get(&self, id: i64) -> Result<Option<Item>> {
        let conn = self.lock()?;

        let item = conn.query_row(
            "SELECT id, name, description FROM items WHERE id = ?1",
            params![id],
            Self::row_to_item,
        );

        match item {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list(&self, page: Page) -> Result<Vec<Item>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, description
            FROM items
            ORDER BY id
            LIMIT ?1 OFFSET ?2
            "#,
        )?;

        let items = stmt
            .query_map(params![page.limit, page.skip], Self::row_to_item)?
            .collect::<rusqlite::Result<Vec<Item>>>()?;

        debug!("Listed {} items", items.len());
        Ok(items)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
