use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

use super::RecordStore;
use crate::entity::EntityKind;
use crate::error::{AssetError, Result};
use crate::submit::OutboundRecord;

/// The Catalog keeps entity records in a local SQLite database.
/// Each record is stored as the JSON object the console sends out.
pub struct Catalog {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl Catalog {
    /// Open (or create) the catalog at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        info!("catalog opened at {}", path.display());

        let mut catalog = Catalog {
            conn,
            db_path: Some(path.to_path_buf()),
        };
        catalog.init_schema()?;
        Ok(catalog)
    }

    /// Throwaway catalog, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let mut catalog = Catalog {
            conn: Connection::open_in_memory()?,
            db_path: None,
        };
        catalog.init_schema()?;
        Ok(catalog)
    }

    /// Create tables and indexes if they don't exist
    fn init_schema(&mut self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS records (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                kind            TEXT NOT NULL,
                record_json     TEXT NOT NULL,
                created_at      INTEGER NOT NULL,
                updated_at      INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_records_kind
             ON records(kind)",
            [],
        )?;

        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn count(&self, kind: EntityKind) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE kind = ?1",
            [kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// All records of one kind, oldest first
    pub fn list(&self, kind: EntityKind) -> Result<Vec<(i64, OutboundRecord)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, record_json FROM records WHERE kind = ?1 ORDER BY id")?;

        let rows = stmt.query_map([kind.as_str()], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, json) = row?;
            records.push((id, serde_json::from_str(&json)?));
        }
        Ok(records)
    }

    fn load_json(&self, kind: EntityKind, id: i64) -> Result<String> {
        self.conn
            .query_row(
                "SELECT record_json FROM records WHERE kind = ?1 AND id = ?2",
                params![kind.as_str(), id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| AssetError::NotFound {
                kind: kind.to_string(),
                id,
            })
    }
}

impl RecordStore for Catalog {
    fn create(&mut self, kind: EntityKind, record: &OutboundRecord) -> Result<i64> {
        let now = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO records (kind, record_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![kind.as_str(), serde_json::to_string(record)?, now],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("created {} #{}", kind, id);
        Ok(id)
    }

    /// Keys missing from `record` keep their stored value; explicit nulls
    /// overwrite it.
    fn update(&mut self, kind: EntityKind, id: i64, record: &OutboundRecord) -> Result<()> {
        let mut stored: OutboundRecord = serde_json::from_str(&self.load_json(kind, id)?)?;
        for (key, value) in record {
            stored.insert(key.clone(), value.clone());
        }

        self.conn.execute(
            "UPDATE records SET record_json = ?1, updated_at = ?2 WHERE kind = ?3 AND id = ?4",
            params![
                serde_json::to_string(&stored)?,
                Utc::now().timestamp(),
                kind.as_str(),
                id
            ],
        )?;
        info!("updated {} #{}", kind, id);
        Ok(())
    }

    fn get(&self, kind: EntityKind, id: i64) -> Result<OutboundRecord> {
        Ok(serde_json::from_str(&self.load_json(kind, id)?)?)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("db_path", &self.db_path)
            .finish()
    }
}
