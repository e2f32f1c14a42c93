// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-set builder — turns an ordered list of PageRefs into a new PDF.
//
// Pages are copied in one batch per source document so that objects shared
// between pages of the same source are copied only once, then appended in
// page-set order with each PageRef's rotation applied on top of whatever the
// source page already had.

use std::collections::BTreeMap;

use prism_core::config::AppConfig;
use prism_core::error::{PrismError, Result};
use prism_core::types::{PageRef, SourceKey};
use tracing::{debug, info, instrument};

use super::copy::{OutputDocument, PageHandle};
use super::source::SourceDocument;

/// Maps a [`PageRef`] to the loaded document and page index it names.
pub trait PageResolver {
    fn source(&self, key: SourceKey) -> Result<&SourceDocument>;

    /// Resolve and bounds-check a page reference.
    fn resolve(&self, page: &PageRef) -> Result<(&SourceDocument, usize)> {
        let source = self.source(page.source)?;
        if page.source_index >= source.page_count() {
            return Err(PrismError::PageIndex {
                index: page.source_index,
                page_count: source.page_count(),
            });
        }
        Ok((source, page.source_index))
    }
}

/// Sources addressed by position.
impl PageResolver for [SourceDocument] {
    fn source(&self, key: SourceKey) -> Result<&SourceDocument> {
        self.get(key.0)
            .ok_or_else(|| PrismError::SourceRead(format!("{key} is not loaded")))
    }
}

impl PageResolver for Vec<SourceDocument> {
    fn source(&self, key: SourceKey) -> Result<&SourceDocument> {
        self.as_slice().source(key)
    }
}

/// A lone document answers to `SourceKey(0)`.
impl PageResolver for SourceDocument {
    fn source(&self, key: SourceKey) -> Result<&SourceDocument> {
        if key.0 == 0 {
            Ok(self)
        } else {
            Err(PrismError::SourceRead(format!("{key} is not loaded")))
        }
    }
}

/// Builds PDFs from page sets.
#[derive(Debug, Clone)]
pub struct PageSetBuilder {
    /// PDF header version of built documents.
    version: String,
    /// Compress streams of built documents.
    compress: bool,
}

impl Default for PageSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSetBuilder {
    pub fn new() -> Self {
        Self {
            version: "1.7".into(),
            compress: false,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            version: config.output_pdf_version.clone(),
            compress: config.compress_outputs,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Build a new PDF whose pages are exactly `pages`, in order.
    ///
    /// Fails with [`PrismError::EmptyPageSet`] for an empty list and
    /// [`PrismError::PageIndex`] if any reference points past the end of its
    /// source; nothing is produced in either case.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn build<R>(&self, pages: &[PageRef], resolver: &R) -> Result<Vec<u8>>
    where
        R: PageResolver + ?Sized,
    {
        if pages.is_empty() {
            return Err(PrismError::EmptyPageSet);
        }

        // Validate everything before copying anything.
        let mut by_source: BTreeMap<SourceKey, Vec<usize>> = BTreeMap::new();
        for (slot, page) in pages.iter().enumerate() {
            resolver.resolve(page)?;
            by_source.entry(page.source).or_default().push(slot);
        }

        let mut output = OutputDocument::create_empty(&self.version);
        let mut handles: Vec<Option<PageHandle>> = vec![None; pages.len()];

        for (key, slots) in &by_source {
            let source = resolver.source(*key)?;
            let indices: Vec<usize> = slots.iter().map(|&slot| pages[slot].source_index).collect();
            let copied = output.copy_pages(source, &indices)?;
            for (&slot, handle) in slots.iter().zip(copied) {
                handles[slot] = Some(handle);
            }
            debug!(source = source.name(), pages = indices.len(), "source batch copied");
        }

        for (page, handle) in pages.iter().zip(handles) {
            let handle = handle.ok_or_else(|| {
                PrismError::Serialize(format!("page {} was not copied", page.id))
            })?;
            if page.rotation.degrees() != 0 {
                let existing = output.rotation(handle);
                output.set_rotation(handle, page.rotation.applied_to(existing))?;
            }
            output.add_page(handle);
        }

        let bytes = output.save(self.compress)?;
        info!(
            pages = pages.len(),
            sources = by_source.len(),
            output_bytes = bytes.len(),
            "page set built"
        );
        Ok(bytes)
    }
}
