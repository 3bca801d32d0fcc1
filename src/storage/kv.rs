//! Durable key/value store abstraction.
//!
//! Session state and named lists only need string get/set/remove. Services
//! depend on [`KeyValueStore`] rather than on SQLite directly.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use super::database::{Database, DatabaseError, Result};
use super::queries;

/// String-keyed persistent store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.with_conn(move |conn| Ok(queries::kv::get(conn, &key)?))
            .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_conn(move |conn| Ok(queries::kv::set(conn, &key, &value)?))
            .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            queries::kv::remove(conn, &key)?;
            Ok(())
        })
        .await
    }
}

/// Reads and deserializes a JSON value stored under `key`.
pub async fn get_json<S, T>(store: &S, key: &str) -> Result<Option<T>>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DatabaseError::Malformed {
                key: key.to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Serializes `value` as JSON and stores it under `key`.
pub async fn set_json<S, T>(store: &S, key: &str, value: &T) -> Result<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|e| DatabaseError::Malformed {
        key: key.to_string(),
        message: e.to_string(),
    })?;
    store.set(key, &raw).await
}
