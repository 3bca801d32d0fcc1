//! Named recipient lists.
//!
//! Lists are kept as one JSON object (name to array of raw entries) under a
//! single store key. Every write replaces the whole object.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::{split_lines, trim_entry, ListSummary, NamedList};
use crate::storage::{get_json, set_json, DatabaseError, KeyValueStore};

/// Storage key for the saved lists.
pub const CLIENTS_KEY: &str = "email_clients";

/// Errors that can occur during list operations.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("list name must not be empty")]
    EmptyName,

    #[error("list '{0}' has no addresses")]
    EmptyList(String),

    #[error("List not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

/// Result type for list operations.
pub type Result<T> = std::result::Result<T, ListError>;

type ListMap = BTreeMap<String, Vec<String>>;

/// Saves, loads and deletes named lists.
pub struct ListService<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> ListService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Saves `addresses` under `name`, replacing any list with that name.
    ///
    /// The name and entries are trimmed and blank entries dropped. Entries
    /// are not validated as addresses.
    pub async fn save(&self, name: &str, addresses: &[String]) -> Result<NamedList> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ListError::EmptyName);
        }

        let entries: Vec<String> = addresses
            .iter()
            .map(|a| trim_entry(a))
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect();
        if entries.is_empty() {
            return Err(ListError::EmptyList(name.to_string()));
        }

        let mut lists = self.read().await?;
        let replaced = lists.insert(name.to_string(), entries.clone()).is_some();
        self.write(&lists).await?;

        tracing::info!(list = %name, count = entries.len(), replaced, "Saved list");
        Ok(NamedList {
            name: name.to_string(),
            addresses: entries,
        })
    }

    /// Saves newline-separated text as a list.
    pub async fn save_from_text(&self, name: &str, raw: &str) -> Result<NamedList> {
        self.save(name, &split_lines(raw)).await
    }

    /// Loads a list by name.
    pub async fn load(&self, name: &str) -> Result<NamedList> {
        let name = name.trim();
        let mut lists = self.read().await?;
        let addresses = lists
            .remove(name)
            .ok_or_else(|| ListError::NotFound(name.to_string()))?;

        Ok(NamedList {
            name: name.to_string(),
            addresses,
        })
    }

    /// Deletes a list. Returns `false` when no list had that name.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let name = name.trim();
        let mut lists = self.read().await?;
        if lists.remove(name).is_none() {
            tracing::debug!(list = %name, "Delete skipped, list not found");
            return Ok(false);
        }

        self.write(&lists).await?;
        tracing::info!(list = %name, "Deleted list");
        Ok(true)
    }

    /// Returns all lists with entry counts, sorted by name.
    pub async fn list(&self) -> Result<Vec<ListSummary>> {
        let lists = self.read().await?;
        Ok(lists
            .into_iter()
            .map(|(name, addresses)| ListSummary {
                name,
                count: addresses.len(),
            })
            .collect())
    }

    async fn read(&self) -> Result<ListMap> {
        Ok(get_json::<S, ListMap>(self.store.as_ref(), CLIENTS_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn write(&self, lists: &ListMap) -> Result<()> {
        set_json(self.store.as_ref(), CLIENTS_KEY, lists).await?;
        Ok(())
    }
}
