//! Partitioned response cache.
//!
//! The engine only talks to the [`CacheStore`] trait. [`CacheDb`] is the
//! SQLite-backed implementation, with async access via tokio-rusqlite. It
//! supports:
//!
//! - Named partitions kept in registration order
//! - Entries addressed by a SHA-256 hash of the request identity
//! - Atomic bulk inserts in a single transaction
//! - An optional per-partition entry quota
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::{CacheStore, StoredResponse};
