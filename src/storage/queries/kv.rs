//! Key/value queries.

use rusqlite::{params, Connection, OptionalExtension, Result};

/// Gets the value stored under `key`.
pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM kv_store WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

/// Inserts or replaces the value stored under `key`.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

/// Removes `key`. Returns whether a row was deleted.
pub fn remove(conn: &Connection, key: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for migration in schema::all_migrations() {
            conn.execute_batch(migration).unwrap();
        }
        conn
    }

    #[test]
    fn set_then_get() {
        let conn = conn();
        set(&conn, "theme", "dark").unwrap();
        assert_eq!(get(&conn, "theme").unwrap(), Some("dark".to_string()));
    }

    #[test]
    fn set_overwrites() {
        let conn = conn();
        set(&conn, "theme", "dark").unwrap();
        set(&conn, "theme", "light").unwrap();
        assert_eq!(get(&conn, "theme").unwrap(), Some("light".to_string()));
    }

    #[test]
    fn missing_key_is_none() {
        let conn = conn();
        assert_eq!(get(&conn, "nothing").unwrap(), None);
    }

    #[test]
    fn remove_reports_deletion() {
        let conn = conn();
        set(&conn, "k", "v").unwrap();
        assert!(remove(&conn, "k").unwrap());
        assert!(!remove(&conn, "k").unwrap());
        assert_eq!(get(&conn, "k").unwrap(), None);
    }
}
