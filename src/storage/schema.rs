//! SQL schema definitions as const strings.

/// SQL to create the key/value table backing all durable client state.
pub const CREATE_KV_STORE: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// Returns all migrations in the order they must run.
pub fn all_migrations() -> Vec<&'static str> {
    vec![CREATE_KV_STORE]
}
