//! Cache-related MCP tools.
//!
//! This module provides tools for looking inside the partition store.

pub mod inspect;

pub use inspect::{CacheInspectParams, inspect_impl};
