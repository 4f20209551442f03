use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, params};

use crate::app::MediaKind;

/// Bazarr history action code for "subtitle synchronized".
pub const SYNC_ACTION: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i64,
    pub description: String,
    pub timestamp: String,
}

/// Read-only handle on Bazarr's database; the connection closes when this is dropped.
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open database at {}", path.display()))?;
        Ok(Self { conn })
    }

    /// Most recent sync entry for the item whose language starts with `language`.
    pub fn latest_sync_record(
        &self,
        kind: MediaKind,
        item_id: &str,
        language: &str,
    ) -> Result<Option<HistoryRecord>> {
        let sql = match kind {
            MediaKind::Movie => {
                "SELECT id, description, timestamp FROM table_history_movie \
                 WHERE radarrId = ?1 AND action = ?2 AND language LIKE ?3 \
                 ORDER BY id DESC LIMIT 1"
            }
            MediaKind::Episode => {
                "SELECT id, description, timestamp FROM table_history \
                 WHERE sonarrEpisodeId = ?1 AND action = ?2 AND language LIKE ?3 \
                 ORDER BY id DESC LIMIT 1"
            }
        };
        let mut stmt = self
            .conn
            .prepare(sql)
            .context("failed to prepare history query")?;
        let mut rows = stmt.query(params![item_id, SYNC_ACTION, format!("{language}%")])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(HistoryRecord {
                id: row.get(0)?,
                description: column_text(row.get_ref(1)?),
                timestamp: column_text(row.get_ref(2)?),
            }));
        }
        Ok(None)
    }
}

fn column_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(v) => v.to_string(),
        ValueRef::Real(v) => v.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}
