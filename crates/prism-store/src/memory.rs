// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory workspace store, for tests and as a fallback when the database
// cannot be opened. Contents are lost when the process exits.

use std::sync::{Mutex, MutexGuard};

use prism_core::error::{PrismError, Result};
use prism_core::types::{FileId, StoredFileMeta};
use tracing::debug;

use crate::integrity::{hash_bytes, verify_hash};
use crate::workspace::{WorkspaceStore, created_now};

struct Record {
    meta: StoredFileMeta,
    sha256: String,
    content: Vec<u8>,
}

/// Records kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, Vec<Record>>> {
        self.records
            .lock()
            .map_err(|_| PrismError::Storage("in-memory store lock poisoned".into()))
    }
}

impl WorkspaceStore for MemoryStore {
    fn save(&self, name: &str, mime_type: &str, content: &[u8]) -> Result<StoredFileMeta> {
        let meta = StoredFileMeta {
            id: FileId::new(),
            name: name.to_owned(),
            mime_type: mime_type.to_owned(),
            size: content.len() as u64,
            created_at: created_now()?,
        };
        self.records()?.push(Record {
            meta: meta.clone(),
            sha256: hash_bytes(content),
            content: content.to_vec(),
        });
        debug!(file_id = %meta.id, "file saved to in-memory workspace");
        Ok(meta)
    }

    fn list(&self) -> Result<Vec<StoredFileMeta>> {
        let records = self.records()?;
        let mut metas: Vec<StoredFileMeta> = records.iter().rev().map(|r| r.meta.clone()).collect();
        // Stable sort keeps reverse insertion order for equal timestamps.
        metas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(metas)
    }

    fn get_meta(&self, id: &FileId) -> Result<Option<StoredFileMeta>> {
        Ok(self
            .records()?
            .iter()
            .find(|r| r.meta.id == *id)
            .map(|r| r.meta.clone()))
    }

    fn get_content(&self, id: &FileId) -> Result<Option<Vec<u8>>> {
        let records = self.records()?;
        let Some(record) = records.iter().find(|r| r.meta.id == *id) else {
            return Ok(None);
        };
        verify_hash(&record.content, &record.sha256)?;
        Ok(Some(record.content.clone()))
    }

    fn delete(&self, id: &FileId) -> Result<()> {
        self.records()?.retain(|r| r.meta.id != *id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::conformance;

    #[test]
    fn save_then_list_and_read() {
        conformance::save_then_list_and_read(&MemoryStore::new());
    }

    #[test]
    fn created_at_is_not_before_the_call() {
        conformance::created_at_is_not_before_the_call(&MemoryStore::new());
    }

    #[test]
    fn delete_is_idempotent() {
        conformance::delete_is_idempotent(&MemoryStore::new());
    }

    #[test]
    fn lists_newest_first() {
        conformance::lists_newest_first(&MemoryStore::new());
    }

    #[test]
    fn unknown_id_is_absent() {
        conformance::unknown_id_is_absent(&MemoryStore::new());
    }

    #[test]
    fn boxed_store_delegates() {
        let store: Box<dyn WorkspaceStore + Send> = Box::new(MemoryStore::new());
        let meta = store.save_named("boxed.zip", b"PK").expect("save");
        assert_eq!(store.list().expect("list").len(), 1);
        assert_eq!(meta.mime_type, "application/zip");
    }
}
