//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - categories(id, name UNIQUE)
//! - items(id, name, category_id, image_name)

pub mod schema;
pub mod sqlite;

pub use sqlite::{ItemRecord, ItemStore, StoreStats};
