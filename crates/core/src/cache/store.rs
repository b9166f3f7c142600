//! Named cache stores.
//!
//! A store is a name (`shell-v2.0.0`, `runtime-v2.0.0`, ...) owning a set of
//! request-keyed response snapshots. [`CacheStorage`] is the seam the
//! controller talks to; [`CacheDb`] implements it on SQLite.

use super::connection::CacheDb;
use crate::Error;
use crate::request::{Method, RequestKey, Response};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

/// Summary of one cache store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoreInfo {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

/// Storage backend for named cache stores.
///
/// Writes are per-key upserts: the last writer for a given key wins.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the store if it does not exist yet.
    async fn open_store(&self, name: &str) -> Result<(), Error>;

    async fn has_store(&self, name: &str) -> Result<bool, Error>;

    /// All store names, oldest first.
    async fn store_names(&self) -> Result<Vec<String>, Error>;

    /// Delete a store and its entries. Returns false if it did not exist.
    async fn delete_store(&self, name: &str) -> Result<bool, Error>;

    /// Upsert one entry, creating the store on demand.
    async fn put(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error>;

    /// Upsert many entries atomically: either all land or none do.
    async fn put_all(&self, store: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error>;

    /// Look up a key in one store.
    async fn match_in(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Look up a key across every store, oldest store first.
    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Keys held by a store, in insertion order.
    async fn keys(&self, store: &str) -> Result<Vec<RequestKey>, Error>;

    /// Store names with entry counts.
    async fn store_infos(&self) -> Result<Vec<StoreInfo>, Error>;
}

/// Fixed-width UTC timestamp so lexical order matches time order.
fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn upsert_entry(conn: &rusqlite::Connection, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers)?;
    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
        params![store, now_ts()],
    )?;
    conn.execute(
        "INSERT INTO cache_entries (store_name, key_hash, method, url, status, headers_json, body, stored_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(store_name, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store,
            key.hash(),
            key.method.as_str(),
            &key.url,
            response.status,
            headers_json,
            &response.body,
            now_ts(),
        ],
    )?;
    Ok(())
}

fn row_to_response(status: u16, headers_json: String, body: Vec<u8>) -> Result<Response, Error> {
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    Ok(Response { status, headers, body })
}

type RawEntry = (u16, String, Vec<u8>);

fn first_entry(stmt: &mut rusqlite::Statement<'_>, params: impl rusqlite::Params) -> Result<Option<Response>, Error> {
    let result = stmt.query_row(params, |row| Ok::<RawEntry, _>((row.get(0)?, row.get(1)?, row.get(2)?)));
    match result {
        Ok((status, headers_json, body)) => row_to_response(status, headers_json, body).map(Some),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![name, now_ts()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY created_at ASC, rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        let store = store.to_string();
        let key = key.clone();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                upsert_entry(&tx, &store, &key, &response)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, store: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        let store = store.to_string();
        let entries = entries.to_vec();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![&store, now_ts()],
                )?;
                for (key, response) in &entries {
                    upsert_entry(&tx, &store, key, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn match_in(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let store = store.to_string();
        let hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, headers_json, body FROM cache_entries
                    WHERE store_name = ?1 AND key_hash = ?2",
                )?;
                first_entry(&mut stmt, params![store, hash])
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.status, e.headers_json, e.body
                    FROM cache_entries e JOIN cache_stores s ON s.name = e.store_name
                    WHERE e.key_hash = ?1
                    ORDER BY s.created_at ASC, s.rowid ASC
                    LIMIT 1",
                )?;
                first_entry(&mut stmt, params![hash])
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt =
                    conn.prepare("SELECT method, url FROM cache_entries WHERE store_name = ?1 ORDER BY rowid ASC")?;
                let rows = stmt
                    .query_map(params![store], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(method, url)| Ok(RequestKey { method: method.parse::<Method>()?, url }))
                    .collect()
            })
            .await
            .map_err(Error::from)
    }

    async fn store_infos(&self) -> Result<Vec<StoreInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.name, s.created_at, COUNT(e.key_hash)
                    FROM cache_stores s LEFT JOIN cache_entries e ON e.store_name = s.name
                    GROUP BY s.name
                    ORDER BY s.created_at ASC, s.rowid ASC",
                )?;
                let infos = stmt
                    .query_map([], |row| {
                        Ok(StoreInfo {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(infos)
            })
            .await
            .map_err(Error::from)
    }
}
