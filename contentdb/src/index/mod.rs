use crate::error::Result;
use crate::schema::{CollectionRegistry, FieldType, ResolvedCollection, INFO_COLLECTION};
use crate::sql::generate_insert;
use crate::transform::{Pipeline, TransformOptions, TransformedContent};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;

/// Row id of the `_info` entry that records the schema checksum.
pub const VERSION_ROW: &str = "checksum";

/// An embedded SQLite store holding one table per resolved collection.
///
/// Tables and rows are written with the generated DDL and DML verbatim.
pub struct ContentIndex {
    conn: Connection,
}

impl ContentIndex {
    /// Open or create the index at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(ContentIndex { conn })
    }

    /// Open an in-memory index (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(ContentIndex { conn })
    }

    /// Create every collection table that does not exist yet.
    pub fn initialize(&self, registry: &CollectionRegistry) -> Result<()> {
        for collection in registry.iter() {
            log::debug!("Creating table for collection '{}'", collection.name);
            self.conn.execute_batch(&collection.table)?;
        }
        log::info!("Initialized content index with {} collections", registry.len());
        Ok(())
    }

    /// Insert or replace one record.
    pub fn upsert(&self, collection: &ResolvedCollection, record: &Map<String, Value>) -> Result<()> {
        let sql = generate_insert(collection, record)?;
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    /// Run a raw file through the pipeline and store the result.
    pub async fn ingest(
        &self,
        pipeline: &Pipeline,
        collection: &ResolvedCollection,
        id: &str,
        raw: &str,
        options: &TransformOptions,
    ) -> Result<TransformedContent> {
        let document = pipeline.transform(id, raw, options).await?;
        self.upsert(collection, &document.to_record())?;
        Ok(document)
    }

    pub fn delete(&self, collection: &ResolvedCollection, id: &str) -> Result<()> {
        self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", collection.name),
            params![id],
        )?;
        Ok(())
    }

    /// Fetch a single row by id.
    pub fn get(&self, collection: &ResolvedCollection, id: &str) -> Result<Option<Map<String, Value>>> {
        let sql = format!("{} WHERE id = ?1", select_all(collection));
        let row = self
            .conn
            .query_row(&sql, params![id], |row| decode_row(collection, row))
            .optional()?;
        Ok(row)
    }

    /// Every row of a collection, ordered by id, with JSON and boolean fields
    /// decoded back into their JSON form.
    pub fn query_collection(&self, collection: &ResolvedCollection) -> Result<Vec<Map<String, Value>>> {
        let sql = format!("{} ORDER BY id", select_all(collection));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| decode_row(collection, row))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Record the registry's checksum as the store version.
    pub fn set_version(&self, registry: &CollectionRegistry) -> Result<()> {
        let info = registry.require(INFO_COLLECTION)?;
        let mut record = Map::new();
        record.insert("id".to_string(), Value::String(VERSION_ROW.to_string()));
        record.insert("version".to_string(), Value::String(registry.checksum()));
        self.upsert(&info, &record)
    }

    /// The stored version, if the index has been initialized and versioned.
    pub fn version(&self) -> Result<Option<String>> {
        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![INFO_COLLECTION],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }

        let version = self
            .conn
            .query_row(
                &format!("SELECT version FROM {INFO_COLLECTION} WHERE id = ?1"),
                params![VERSION_ROW],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version)
    }

    /// Whether the stored version matches the registry's current checksum.
    pub fn is_current(&self, registry: &CollectionRegistry) -> Result<bool> {
        Ok(self.version()?.as_deref() == Some(registry.checksum().as_str()))
    }
}

fn select_all(collection: &ResolvedCollection) -> String {
    let columns: Vec<&str> = collection.fields.keys().map(String::as_str).collect();
    format!("SELECT {} FROM {}", columns.join(", "), collection.name)
}

fn decode_row(
    collection: &ResolvedCollection,
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<Map<String, Value>> {
    let mut obj = Map::new();
    for (i, (name, field)) in collection.fields.iter().enumerate() {
        let val: rusqlite::types::Value = row.get(i)?;
        let json_val = match val {
            rusqlite::types::Value::Null => Value::Null,
            rusqlite::types::Value::Integer(n) => {
                if matches!(field.underlying_type(), FieldType::Boolean) {
                    Value::Bool(n != 0)
                } else {
                    Value::Number(n.into())
                }
            }
            rusqlite::types::Value::Real(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            rusqlite::types::Value::Text(s) => {
                if collection.is_json_field(name) {
                    serde_json::from_str(&s).unwrap_or(Value::String(s))
                } else {
                    Value::String(s)
                }
            }
            rusqlite::types::Value::Blob(b) => Value::String(String::from_utf8_lossy(&b).into()),
        };
        obj.insert(name.clone(), json_val);
    }
    Ok(obj)
}
