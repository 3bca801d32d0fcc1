//! Durable storage and credential storage.
//!
//! - SQLite-backed key/value store for session state and named lists
//! - OS keychain integration for the provider API key
//! - Async-safe database operations via tokio::task::spawn_blocking

mod database;
mod keychain;
mod kv;
pub mod queries;
mod schema;

pub use database::{Database, DatabaseError, Result};
pub use keychain::{KeychainAccess, KeychainError};
pub use kv::{get_json, set_json, KeyValueStore};

use std::sync::Arc;

/// Combined storage layer with database and keychain access.
#[derive(Debug, Clone)]
pub struct StorageLayer {
    db: Arc<Database>,
    keychain: KeychainAccess,
}

impl StorageLayer {
    /// Opens the storage layer with the database at the given path.
    pub async fn new(db_path: impl AsRef<std::path::Path>) -> Result<Self> {
        let db = Database::open(db_path).await?;

        Ok(Self {
            db: Arc::new(db),
            keychain: KeychainAccess::new(),
        })
    }

    /// Creates a storage layer with an in-memory database for testing.
    pub async fn in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;

        Ok(Self {
            db: Arc::new(db),
            keychain: KeychainAccess::with_service("io.smartsend.test"),
        })
    }

    /// Returns a shared handle to the database.
    pub fn db(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }

    /// Returns a reference to the keychain.
    pub fn keychain(&self) -> &KeychainAccess {
        &self.keychain
    }
}
