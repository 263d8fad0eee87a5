//! The opaque cache store interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Error;
use crate::http::{RequestKey, Response};

/// A response snapshot as it sits in a partition.
///
/// Snapshots are never mutated in place; a newer `put` replaces them wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    pub key: RequestKey,
    pub response: Response,
    pub stored_at: DateTime<Utc>,
}

/// Persistent key-value store of named partitions.
///
/// Implementations must serialize concurrent writes to the same partition.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the partition if it does not exist yet.
    async fn open(&self, partition: &str) -> Result<(), Error>;

    async fn has(&self, partition: &str) -> Result<bool, Error>;

    /// All partition names, in registration order.
    async fn partitions(&self) -> Result<Vec<String>, Error>;

    /// Delete a partition and every entry in it. Returns whether it existed.
    async fn delete(&self, partition: &str) -> Result<bool, Error>;

    /// Look up a single entry in one partition.
    async fn match_in(&self, partition: &str, key: &RequestKey) -> Result<Option<StoredResponse>, Error>;

    /// Store a response, replacing any previous entry under the same key.
    ///
    /// Opens the partition if needed.
    async fn put(&self, partition: &str, key: &RequestKey, response: &Response) -> Result<(), Error>;

    /// Store several responses atomically: either every entry is committed or none is.
    async fn put_all(&self, partition: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error>;

    /// Request identities stored in a partition, oldest first.
    async fn entry_keys(&self, partition: &str) -> Result<Vec<RequestKey>, Error>;
}
