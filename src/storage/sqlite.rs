//! SQLite storage implementation

use rusqlite::{Connection, params};
use serde::Serialize;
use std::path::Path;

use super::schema;
use crate::Result;

/// SQLite-backed storage for categories and items
pub struct ItemStore {
    conn: Connection,
}

impl ItemStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Category Operations ==========

    /// Resolve a category name to its id, creating the row on first use.
    ///
    /// Single atomic insert-or-fetch: the conflict-tolerant insert leans on
    /// the UNIQUE constraint, so concurrent callers resolving the same name
    /// cannot produce duplicate categories.
    pub fn resolve_or_create_category(&self, name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO categories (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            [name],
        )?;
        let id = self
            .conn
            .query_row("SELECT id FROM categories WHERE name = ?1", [name], |row| {
                row.get(0)
            })?;
        Ok(id)
    }

    /// Count all categories
    pub fn count_categories(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Item Operations ==========

    /// Insert an item referencing an existing category and a stored image
    pub fn insert_item(&self, name: &str, category_id: i64, image_name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO items (name, category_id, image_name) VALUES (?1, ?2, ?3)",
            params![name, category_id, image_name],
        )?;
        Ok(())
    }

    /// List all items joined to their category name, in row order
    pub fn list_items(&self) -> Result<Vec<ItemRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT items.id, items.name, categories.name AS category, items.image_name
             FROM items
             JOIN categories ON items.category_id = categories.id",
        )?;

        let items = stmt
            .query_map([], row_to_item)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(items)
    }

    /// Find items whose name contains the keyword (LIKE substring match)
    pub fn search_items(&self, keyword: &str) -> Result<Vec<ItemRecord>> {
        let pattern = format!("%{}%", keyword);

        let mut stmt = self.conn.prepare(
            "SELECT items.id, items.name, categories.name AS category, items.image_name
             FROM items
             JOIN categories ON items.category_id = categories.id
             WHERE items.name LIKE ?1",
        )?;

        let items = stmt
            .query_map([pattern], row_to_item)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(items)
    }

    /// Count all items
    pub fn count_items(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            items: self.count_items()?,
            categories: self.count_categories()?,
        })
    }
}

/// Helper to convert a row to an ItemRecord
fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<ItemRecord> {
    Ok(ItemRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        image_name: row.get(3)?,
    })
}

/// An item joined to its category name, as clients see it
#[derive(Debug, Clone, Serialize)]
pub struct ItemRecord {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub image_name: String,
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub items: usize,
    pub categories: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Items: {}", self.items)?;
        writeln!(f, "  Categories: {}", self.categories)
    }
}
