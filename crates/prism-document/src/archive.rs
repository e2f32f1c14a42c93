// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ZIP archiving for split-all output.

use std::io::{Cursor, Write};

use prism_core::error::{PrismError, Result};
use tracing::debug;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// In-memory ZIP archive built one entry at a time.
///
/// Entries are written straight into the archive buffer as they are added,
/// so callers can drop each entry's bytes before producing the next one.
pub struct ZipArchiver {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipArchiver {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            entries: 0,
        }
    }

    /// Append an entry. Entry order in the archive is insertion order.
    pub fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.writer
            .start_file(name, self.options)
            .map_err(|e| PrismError::Serialize(format!("failed to create ZIP entry {name}: {e}")))?;
        self.writer
            .write_all(bytes)
            .map_err(|e| PrismError::Serialize(format!("failed to write ZIP entry {name}: {e}")))?;

        self.entries += 1;
        debug!(name, entry_bytes = bytes.len(), "archive entry added");
        Ok(())
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Finish the archive and return its bytes.
    pub fn generate(self) -> Result<Vec<u8>> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| PrismError::Serialize(format!("failed to finalize ZIP: {e}")))?;
        Ok(cursor.into_inner())
    }
}
