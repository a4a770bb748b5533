//! # Marketd - Marketplace Listing Backend
//!
//! Minimal backend for a marketplace frontend: clients submit items
//! (name, category, image) and query them by listing or keyword search.
//!
//! Marketd provides:
//! - Content-addressed image storage keyed by SHA-256 digest
//! - SQLite-backed categories and items with lazy category creation
//! - Axum HTTP API with multipart item submission and keyword search
//! - Single-origin CORS for the browser frontend

pub mod config;
pub mod images;
pub mod server;
pub mod storage;

// Re-exports for convenient access
pub use images::ImageStore;
pub use storage::ItemStore;

/// Result type alias for Marketd operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Marketd operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image name: {0}")]
    InvalidImageName(String),
}
