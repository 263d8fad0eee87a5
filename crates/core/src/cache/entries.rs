//! `CacheStore` implementation for the SQLite database.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};
use url::Url;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use super::store::{CacheStore, StoredResponse};
use crate::Error;
use crate::http::{Headers, RequestKey, Response, ResponseType};

/// Column values for one entry, ready to bind.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: i64,
    response_type: &'static str,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn encode(key: &RequestKey, response: &Response) -> Result<Self, Error> {
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::InvalidInput(format!("unserializable headers: {e}")))?;
        Ok(Self {
            key_hash: compute_cache_key(key),
            method: key.method.clone(),
            url: key.url.clone(),
            status: i64::from(response.status),
            response_type: response.response_type.as_str(),
            headers_json,
            body: response.body.to_vec(),
        })
    }
}

fn ensure_partition(conn: &rusqlite::Connection, partition: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
        params![partition, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn check_quota(
    conn: &rusqlite::Connection, partition: &str, key_hash: &str, max_entries: Option<usize>,
) -> Result<(), Error> {
    let Some(limit) = max_entries else {
        return Ok(());
    };

    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM entries WHERE partition = ?1 AND key_hash = ?2)",
        params![partition, key_hash],
        |row| row.get(0),
    )?;
    if exists {
        return Ok(());
    }

    let count: i64 =
        conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| row.get(0))?;
    if count as usize >= limit {
        return Err(Error::QuotaExceeded { partition: partition.to_string(), limit });
    }
    Ok(())
}

fn insert_entry(conn: &rusqlite::Connection, partition: &str, row: &EntryRow) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO entries (
            partition, key_hash, method, url, status, response_type, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(partition, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            response_type = excluded.response_type,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            partition,
            &row.key_hash,
            &row.method,
            &row.url,
            row.status,
            row.response_type,
            &row.headers_json,
            &row.body,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn decode_entry(
    key: RequestKey, status: i64, response_type: String, headers_json: String, body: Vec<u8>, stored_at: String,
) -> Result<StoredResponse, Error> {
    let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status} for {key}")))?;
    let response_type = ResponseType::parse(&response_type)
        .ok_or_else(|| Error::CorruptEntry(format!("response type {response_type:?} for {key}")))?;
    let headers: Headers = serde_json::from_str(&headers_json)
        .map_err(|e| Error::CorruptEntry(format!("headers for {key}: {e}")))?;
    let stored_at = DateTime::parse_from_rfc3339(&stored_at)
        .map_err(|e| Error::CorruptEntry(format!("timestamp for {key}: {e}")))?
        .with_timezone(&Utc);

    let response = Response { status, response_type, url: Url::parse(&key.url).ok(), headers, body: Bytes::from(body) };

    Ok(StoredResponse { key, response, stored_at })
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, partition: &str) -> Result<(), Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> { ensure_partition(conn, &partition) })
            .await
            .map_err(Error::from)
    }

    async fn has(&self, partition: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn
                    .query_row("SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)", params![partition], |row| {
                        row.get(0)
                    })
                    .map_err(Error::from)?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, partition: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM partitions WHERE name = ?1", params![partition])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_in(&self, partition: &str, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        let partition = partition.to_string();
        let key = key.clone();
        let key_hash = compute_cache_key(&key);
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status, response_type, headers_json, body, stored_at
                        FROM entries WHERE partition = ?1 AND key_hash = ?2",
                        params![partition, key_hash],
                        |row| {
                            Ok((
                                row.get::<_, i64>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, Vec<u8>>(3)?,
                                row.get::<_, String>(4)?,
                            ))
                        },
                    )
                    .optional()?;

                match row {
                    Some((status, response_type, headers_json, body, stored_at)) => {
                        decode_entry(key, status, response_type, headers_json, body, stored_at).map(Some)
                    }
                    None => Ok(None),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, partition: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        let partition = partition.to_string();
        let row = EntryRow::encode(key, response)?;
        let max_entries = self.max_entries;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_partition(&tx, &partition)?;
                check_quota(&tx, &partition, &row.key_hash, max_entries)?;
                insert_entry(&tx, &partition, &row)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, partition: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        let partition = partition.to_string();
        let rows = entries
            .iter()
            .map(|(key, response)| EntryRow::encode(key, response))
            .collect::<Result<Vec<_>, _>>()?;
        let max_entries = self.max_entries;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                // Dropping the transaction on any error rolls back every row.
                let tx = conn.transaction()?;
                ensure_partition(&tx, &partition)?;
                for row in &rows {
                    check_quota(&tx, &partition, &row.key_hash, max_entries)?;
                    insert_entry(&tx, &partition, row)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn entry_keys(&self, partition: &str) -> Result<Vec<RequestKey>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url FROM entries WHERE partition = ?1 ORDER BY stored_at ASC, rowid ASC",
                )?;
                let keys = stmt
                    .query_map(params![partition], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}
