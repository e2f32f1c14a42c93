// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The workspace store interface.
//
// Features only ever see this trait. The durable SQLite backend and the
// in-memory fake both implement it, so either can be injected.

use chrono::{DateTime, Utc};
use prism_core::error::{PrismError, Result};
use prism_core::types::{FileId, StoredFileMeta, mime_for_name};

/// Durable keyed blob storage for finished artifacts.
///
/// Records are written and removed whole; there is no update in place.
pub trait WorkspaceStore {
    /// Store `content` under a freshly generated id and return its metadata.
    ///
    /// The record is either stored completely or not at all.
    fn save(&self, name: &str, mime_type: &str, content: &[u8]) -> Result<StoredFileMeta>;

    /// Metadata of every record, newest first. Content is not loaded.
    fn list(&self) -> Result<Vec<StoredFileMeta>>;

    /// Metadata of one record, or `None` if the id is unknown.
    fn get_meta(&self, id: &FileId) -> Result<Option<StoredFileMeta>>;

    /// Full payload of one record, or `None` if the id is unknown or deleted.
    fn get_content(&self, id: &FileId) -> Result<Option<Vec<u8>>>;

    /// Remove a record. Deleting an unknown id is not an error.
    fn delete(&self, id: &FileId) -> Result<()>;

    /// [`save`](Self::save) with the MIME type inferred from `name`.
    fn save_named(&self, name: &str, content: &[u8]) -> Result<StoredFileMeta> {
        self.save(name, mime_for_name(name), content)
    }
}

impl<S: WorkspaceStore + ?Sized> WorkspaceStore for Box<S> {
    fn save(&self, name: &str, mime_type: &str, content: &[u8]) -> Result<StoredFileMeta> {
        (**self).save(name, mime_type, content)
    }

    fn list(&self) -> Result<Vec<StoredFileMeta>> {
        (**self).list()
    }

    fn get_meta(&self, id: &FileId) -> Result<Option<StoredFileMeta>> {
        (**self).get_meta(id)
    }

    fn get_content(&self, id: &FileId) -> Result<Option<Vec<u8>>> {
        (**self).get_content(id)
    }

    fn delete(&self, id: &FileId) -> Result<()> {
        (**self).delete(id)
    }
}

/// Current time, kept at full precision so a record is never stamped earlier
/// than an instant observed before its save.
pub(crate) fn created_now() -> Result<DateTime<Utc>> {
    let now = Utc::now();
    stored_nanos(&now)?;
    Ok(now)
}

/// Nanoseconds since the epoch, the form `created_at` is persisted in.
pub(crate) fn stored_nanos(at: &DateTime<Utc>) -> Result<i64> {
    at.timestamp_nanos_opt()
        .ok_or_else(|| PrismError::Storage("system clock out of range".into()))
}
