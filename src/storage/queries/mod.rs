//! Database query modules.
//!
//! Each module provides synchronous functions over a borrowed connection;
//! callers run them through [`Database::with_conn`](super::Database::with_conn).

pub mod kv;
