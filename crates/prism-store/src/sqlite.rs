// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Workspace store backed by SQLite.
//
// One row per stored file, holding metadata, a SHA-256 digest and the content
// blob. Listing reads metadata columns only. Every write is a single
// statement, so SQLite's own atomicity guarantees a reader never sees a
// half-written record.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument, warn};

use prism_core::error::{PrismError, Result};
use prism_core::types::{FileId, StoredFileMeta};

use crate::integrity::{hash_bytes, verify_hash};
use crate::workspace::{WorkspaceStore, created_now, stored_nanos};

/// SQLite schema for the files table.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS files (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        mime_type TEXT NOT NULL,
        size INTEGER NOT NULL,
        created_at INTEGER NOT NULL, -- nanoseconds since the epoch
        sha256 TEXT NOT NULL,
        content BLOB NOT NULL
    );
    CREATE INDEX IF NOT EXISTS files_created_at ON files (created_at);
"#;

/// Metadata columns, in the order `row_to_meta` expects.
const META_COLUMNS: &str = "id, name, mime_type, size, created_at";

/// Workspace store in a local SQLite database.
///
/// All methods are synchronous because `rusqlite` does not support async
/// natively.  In an async context, wrap calls in `tokio::task::spawn_blocking`.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the workspace database at the given path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| PrismError::Storage(format!("open: {e}")))?;

        // WAL keeps readers unblocked during writes and survives unclean
        // shutdowns.
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| PrismError::Storage(format!("WAL pragma: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| PrismError::Storage(format!("create table: {e}")))?;

        info!("workspace database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PrismError::Storage(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| PrismError::Storage(format!("create table: {e}")))?;

        debug!("in-memory workspace database opened");
        Ok(Self { conn })
    }
}

impl WorkspaceStore for SqliteStore {
    #[instrument(skip(self, content), fields(bytes_len = content.len()))]
    fn save(&self, name: &str, mime_type: &str, content: &[u8]) -> Result<StoredFileMeta> {
        let meta = StoredFileMeta {
            id: FileId::new(),
            name: name.to_owned(),
            mime_type: mime_type.to_owned(),
            size: content.len() as u64,
            created_at: created_now()?,
        };
        let created_nanos = stored_nanos(&meta.created_at)?;

        self.conn
            .execute(
                "INSERT INTO files (id, name, mime_type, size, created_at, sha256, content)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    meta.id.to_string(),
                    meta.name,
                    meta.mime_type,
                    meta.size as i64,
                    created_nanos,
                    hash_bytes(content),
                    content,
                ],
            )
            .map_err(|e| PrismError::Storage(format!("insert file: {e}")))?;

        info!(file_id = %meta.id, "file saved to workspace");
        Ok(meta)
    }

    #[instrument(skip(self))]
    fn list(&self) -> Result<Vec<StoredFileMeta>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {META_COLUMNS} FROM files ORDER BY created_at DESC, rowid DESC"
            ))
            .map_err(|e| PrismError::Storage(format!("prepare list: {e}")))?;

        let files = stmt
            .query_map([], row_to_meta)
            .map_err(|e| PrismError::Storage(format!("query list: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PrismError::Storage(format!("collect rows: {e}")))?;

        debug!(count = files.len(), "listed workspace files");
        Ok(files)
    }

    #[instrument(skip(self), fields(file_id = %id))]
    fn get_meta(&self, id: &FileId) -> Result<Option<StoredFileMeta>> {
        self.conn
            .query_row(
                &format!("SELECT {META_COLUMNS} FROM files WHERE id = ?1"),
                params![id.to_string()],
                row_to_meta,
            )
            .optional()
            .map_err(|e| PrismError::Storage(format!("query get_meta: {e}")))
    }

    #[instrument(skip(self), fields(file_id = %id))]
    fn get_content(&self, id: &FileId) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>, String)> = self
            .conn
            .query_row(
                "SELECT content, sha256 FROM files WHERE id = ?1",
                params![id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| PrismError::Storage(format!("query get_content: {e}")))?;

        let Some((content, digest)) = row else {
            return Ok(None);
        };

        if let Err(err) = verify_hash(&content, &digest) {
            warn!(file_id = %id, "stored content failed its integrity check");
            return Err(err);
        }
        Ok(Some(content))
    }

    #[instrument(skip(self), fields(file_id = %id))]
    fn delete(&self, id: &FileId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM files WHERE id = ?1", params![id.to_string()])
            .map_err(|e| PrismError::Storage(format!("delete file: {e}")))?;

        info!(removed = rows, "workspace file deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Map a row selected with [`META_COLUMNS`] to metadata.
fn row_to_meta(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredFileMeta> {
    let id_str: String = row.get(0)?;
    let name: String = row.get(1)?;
    let mime_type: String = row.get(2)?;
    let size: i64 = row.get(3)?;
    let created_nanos: i64 = row.get(4)?;

    let uuid = uuid::Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::from_timestamp_nanos(created_nanos);

    Ok(StoredFileMeta {
        id: FileId(uuid),
        name,
        mime_type,
        size: size.max(0) as u64,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::conformance;

    #[test]
    fn save_then_list_and_read() {
        let store = SqliteStore::open_in_memory().expect("open in-memory db");
        conformance::save_then_list_and_read(&store);
    }

    #[test]
    fn created_at_is_not_before_the_call() {
        let store = SqliteStore::open_in_memory().expect("open in-memory db");
        conformance::created_at_is_not_before_the_call(&store);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = SqliteStore::open_in_memory().expect("open in-memory db");
        conformance::delete_is_idempotent(&store);
    }

    #[test]
    fn lists_newest_first() {
        let store = SqliteStore::open_in_memory().expect("open in-memory db");
        conformance::lists_newest_first(&store);
    }

    #[test]
    fn unknown_id_is_absent() {
        let store = SqliteStore::open_in_memory().expect("open in-memory db");
        conformance::unknown_id_is_absent(&store);
    }

    #[test]
    fn tampered_content_fails_integrity() {
        let store = SqliteStore::open_in_memory().expect("open in-memory db");
        let meta = store.save_named("a.pdf", b"original").expect("save");

        store
            .conn
            .execute(
                "UPDATE files SET content = ?1 WHERE id = ?2",
                params![b"changed".as_slice(), meta.id.to_string()],
            )
            .expect("tamper");

        assert!(matches!(
            store.get_content(&meta.id),
            Err(PrismError::Integrity { .. })
        ));
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("workspace.db");

        let meta = {
            let store = SqliteStore::open(&path).expect("open");
            store.save_named("kept.pdf", b"durable bytes").expect("save")
        };

        let store = SqliteStore::open(&path).expect("reopen");
        assert_eq!(store.list().expect("list"), vec![meta.clone()]);
        assert_eq!(
            store.get_content(&meta.id).expect("get").as_deref(),
            Some(b"durable bytes".as_slice())
        );
    }
}
