//! Core types and shared functionality for offgrid.
//!
//! This crate provides:
//! - Partitioned response cache with a SQLite backend
//! - Request/response value types
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod url;

pub use cache::{CacheDb, CacheStore, StoredResponse};
pub use config::{AppConfig, ConfigError, NotificationDefaults, PartitionNames};
pub use error::Error;
pub use http::{Destination, Headers, Request, RequestKey, Response, ResponseType};
