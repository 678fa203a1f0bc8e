//! # Key-Value Storage
//!
//! Uniform access to the entity tables. Each table holds one JSON document per `id`;
//! the only secondary index is `LeadIdIndex` on the `leadId` attribute.
//!
//! The store is backed by SQLite but behaves like the managed key-value store the
//! service was designed against:
//!
//! - `scan_items` and `query_items` read at most `limit` records in key order, *then*
//!   apply the filter, so a page may hold fewer than `limit` items.
//! - Whenever `limit` records were read, the last one's key is returned as
//!   `last_evaluated_key`; passing it back as `start_key` resumes after it.
//! - `update_item` merges a partial record, ignores any `id` in it, always stamps
//!   `updatedAt`, and creates the record if it does not exist.
//! - `delete_item` succeeds whether or not the record exists.
//!
//! Every failure is returned as a `StoreError`; nothing is retried here.

pub mod expression;

pub use expression::Predicate;

use crate::config::is_identifier;
use crate::timestamps;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Name of the secondary index on `leadId`.
pub const LEAD_ID_INDEX: &str = "LeadIdIndex";

const LEAD_ID_ATTRIBUTE: &str = "leadId";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("item (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("item must serialize to a JSON object with a string 'id'")]
    InvalidItem,
    #[error("invalid table name '{0}'")]
    InvalidTable(String),
    #[error("no index '{index}' with key attribute '{attribute}'")]
    UnknownIndex { index: String, attribute: String },
}

/// Key of the last record a scan or query evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StartKey {
    pub id: String,
    /// Present on keys produced by index queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
}

#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub last_evaluated_key: Option<StartKey>,
}

/// Equality condition on an index key attribute.
#[derive(Debug, Clone, Copy)]
pub struct KeyCondition<'a> {
    pub attribute: &'a str,
    pub value: &'a str,
}

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (or creates) the database at `path` and makes sure every table exists.
    pub fn open(path: &str, tables: &[&str]) -> Result<Self, StoreError> {
        if path == ":memory:" {
            return Self::open_in_memory(tables);
        }
        Self::with_connection(Connection::open(Path::new(path))?, tables)
    }

    pub fn open_in_memory(tables: &[&str]) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, tables)
    }

    fn with_connection(conn: Connection, tables: &[&str]) -> Result<Self, StoreError> {
        for table in tables {
            create_table(&conn, table)?;
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn get_item<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        check_table(table)?;
        let conn = self.conn.lock().await;
        let raw: Option<String> = conn
            .query_row(
                &format!("SELECT item FROM \"{table}\" WHERE id = ?1"),
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Writes `item` under its `id`, replacing any previous record.
    pub async fn put_item<T: Serialize>(&self, table: &str, item: T) -> Result<T, StoreError> {
        check_table(table)?;
        let value = serde_json::to_value(&item)?;
        let object = value.as_object().ok_or(StoreError::InvalidItem)?;
        let conn = self.conn.lock().await;
        write_item(&conn, table, object)?;
        Ok(item)
    }

    /// Merges `partial` into the record `id` and returns the updated record.
    pub async fn update_item<T, U>(&self, table: &str, id: &str, partial: &U) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
        U: Serialize,
    {
        check_table(table)?;
        let patch = match serde_json::to_value(partial)? {
            Value::Object(patch) => patch,
            _ => return Err(StoreError::InvalidItem),
        };

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let existing: Option<String> = tx
            .query_row(
                &format!("SELECT item FROM \"{table}\" WHERE id = ?1"),
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let mut item = match existing {
            Some(raw) => match serde_json::from_str(&raw)? {
                Value::Object(item) => item,
                _ => return Err(StoreError::InvalidItem),
            },
            None => {
                let mut item = Map::new();
                item.insert("id".to_string(), Value::String(id.to_string()));
                item
            }
        };

        for (field, value) in patch {
            if field != "id" {
                item.insert(field, value);
            }
        }
        item.insert("updatedAt".to_string(), Value::String(timestamps::now()));

        write_item(&tx, table, &item)?;
        tx.commit()?;
        Ok(serde_json::from_value(Value::Object(item))?)
    }

    pub async fn delete_item(&self, table: &str, id: &str) -> Result<(), StoreError> {
        check_table(table)?;
        let conn = self.conn.lock().await;
        conn.execute(&format!("DELETE FROM \"{table}\" WHERE id = ?1"), params![id])?;
        Ok(())
    }

    /// Reads records whose index key equals `key`, in id order.
    ///
    /// Without an index name the condition must be on the primary key `id`.
    pub async fn query_items<T: DeserializeOwned>(
        &self,
        table: &str,
        index: Option<&str>,
        key: KeyCondition<'_>,
        filter: Option<&Predicate>,
        limit: u32,
        start_key: Option<&StartKey>,
    ) -> Result<Page<T>, StoreError> {
        check_table(table)?;
        let column = match index {
            Some(LEAD_ID_INDEX) if key.attribute == LEAD_ID_ATTRIBUTE => "lead_id",
            None if key.attribute == "id" => "id",
            _ => {
                return Err(StoreError::UnknownIndex {
                    index: index.unwrap_or("<primary>").to_string(),
                    attribute: key.attribute.to_string(),
                })
            }
        };
        let after = start_key.map_or("", |k| k.id.as_str());
        let limit = limit.max(1);

        let rows = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(&format!(
                "SELECT id, item FROM \"{table}\" WHERE {column} = ?1 AND id > ?2 ORDER BY id LIMIT ?3"
            ))?;
            let rows = stmt
                .query_map(params![key.value, after, limit], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let lead_id = (column == "lead_id").then(|| key.value.to_string());
        evaluate(rows, filter, limit, lead_id)
    }

    /// Reads the table in id order, starting after `start_key`.
    pub async fn scan_items<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: Option<&Predicate>,
        limit: u32,
        start_key: Option<&StartKey>,
    ) -> Result<Page<T>, StoreError> {
        check_table(table)?;
        let after = start_key.map_or("", |k| k.id.as_str());
        let limit = limit.max(1);

        let rows = {
            let conn = self.conn.lock().await;
            let mut stmt = conn.prepare(&format!(
                "SELECT id, item FROM \"{table}\" WHERE id > ?1 ORDER BY id LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![after, limit], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        evaluate(rows, filter, limit, None)
    }
}

fn check_table(table: &str) -> Result<(), StoreError> {
    if is_identifier(table) {
        Ok(())
    } else {
        Err(StoreError::InvalidTable(table.to_string()))
    }
}

fn create_table(conn: &Connection, table: &str) -> Result<(), StoreError> {
    check_table(table)?;
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (
             id TEXT PRIMARY KEY,
             lead_id TEXT,
             item TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS \"{table}_lead_id\" ON \"{table}\" (lead_id, id);"
    ))?;
    Ok(())
}

fn write_item(conn: &Connection, table: &str, item: &Map<String, Value>) -> Result<(), StoreError> {
    let id = item
        .get("id")
        .and_then(Value::as_str)
        .ok_or(StoreError::InvalidItem)?;
    let lead_id = item.get(LEAD_ID_ATTRIBUTE).and_then(Value::as_str);
    let raw = serde_json::to_string(item)?;
    conn.execute(
        &format!("INSERT OR REPLACE INTO \"{table}\" (id, lead_id, item) VALUES (?1, ?2, ?3)"),
        params![id, lead_id, raw],
    )?;
    Ok(())
}

/// Applies `filter` to the rows read for one page and works out the continuation key.
fn evaluate<T: DeserializeOwned>(
    rows: Vec<(String, String)>,
    filter: Option<&Predicate>,
    limit: u32,
    lead_id: Option<String>,
) -> Result<Page<T>, StoreError> {
    let last_evaluated_key = if rows.len() >= limit as usize {
        rows.last().map(|(id, _)| StartKey {
            id: id.clone(),
            lead_id: lead_id.clone(),
        })
    } else {
        None
    };

    let evaluated = rows.len();
    let mut items = Vec::new();
    for (_, raw) in rows {
        let value: Value = serde_json::from_str(&raw)?;
        if filter.map_or(true, |p| p.matches(&value)) {
            items.push(serde_json::from_value(value)?);
        }
    }
    debug!("Evaluated {} records, {} matched", evaluated, items.len());

    Ok(Page {
        items,
        last_evaluated_key,
    })
}
