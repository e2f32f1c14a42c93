// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch splitter — one single-page document per source page.

use prism_core::error::Result;
use prism_core::types::{PageRef, SourceKey};
use tracing::{info, instrument};

use super::builder::PageSetBuilder;
use super::source::SourceDocument;
use crate::archive::ZipArchiver;

/// One page split out into its own document.
#[derive(Debug, Clone)]
pub struct SplitPage {
    /// `page-{n}.pdf`, 1-based.
    pub file_name: String,
    /// 1-based page number in the source.
    pub page_number: usize,
    pub bytes: Vec<u8>,
}

/// Archive entry name for a 1-based page number.
pub fn split_file_name(page_number: usize) -> String {
    format!("page-{page_number}.pdf")
}

/// Lazily builds single-page documents in page order.
///
/// Each item is produced on demand, so a caller that streams into an archive
/// holds at most one page document at a time.
pub struct SplitPages<'a> {
    source: &'a SourceDocument,
    builder: &'a PageSetBuilder,
    next: usize,
}

impl Iterator for SplitPages<'_> {
    type Item = Result<SplitPage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.source.page_count() {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let page = PageRef::new(SourceKey(0), index);
        Some(self.builder.build(&[page], self.source).map(|bytes| SplitPage {
            file_name: split_file_name(index + 1),
            page_number: index + 1,
            bytes,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.source.page_count().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

/// Iterate over `source` as single-page documents.
pub fn split_pages<'a>(source: &'a SourceDocument, builder: &'a PageSetBuilder) -> SplitPages<'a> {
    SplitPages {
        source,
        builder,
        next: 0,
    }
}

/// Split every page into its own document and pack them into a ZIP archive
/// with entries `page-1.pdf` .. `page-N.pdf`.
#[instrument(skip_all, fields(source = source.name(), pages = source.page_count()))]
pub fn split_all_to_archive(source: &SourceDocument, builder: &PageSetBuilder) -> Result<Vec<u8>> {
    let mut archive = ZipArchiver::new();
    for page in split_pages(source, builder) {
        let page = page?;
        archive.add_entry(&page.file_name, &page.bytes)?;
    }
    let bytes = archive.generate()?;

    info!(archive_bytes = bytes.len(), "split archive generated");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::sample;

    #[test]
    fn yields_one_document_per_page() {
        let source = SourceDocument::from_bytes("s.pdf", &sample::sample_pdf(3)).expect("load");
        let builder = PageSetBuilder::new();
        let pages: Vec<SplitPage> = split_pages(&source, &builder)
            .collect::<Result<_>>()
            .expect("split");

        assert_eq!(pages.len(), 3);
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.page_number, i + 1);
            assert_eq!(page.file_name, format!("page-{}.pdf", i + 1));
            assert_eq!(
                sample::page_labels(&page.bytes).expect("labels"),
                vec![format!("p{}", i + 1)]
            );
        }
    }

    #[test]
    fn archive_has_ordered_entries() {
        let source = SourceDocument::from_bytes("s.pdf", &sample::sample_pdf(3)).expect("load");
        let bytes = split_all_to_archive(&source, &PageSetBuilder::new()).expect("archive");

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).expect("zip");
        assert_eq!(zip.len(), 3);
        for i in 0..3 {
            let mut entry = zip.by_index(i).expect("entry");
            assert_eq!(entry.name(), format!("page-{}.pdf", i + 1));
            let mut pdf = Vec::new();
            entry.read_to_end(&mut pdf).expect("read");
            assert_eq!(
                sample::page_labels(&pdf).expect("labels"),
                vec![format!("p{}", i + 1)]
            );
        }
    }

    #[test]
    fn size_hint_counts_down() {
        let source = SourceDocument::from_bytes("s.pdf", &sample::sample_pdf(2)).expect("load");
        let builder = PageSetBuilder::new();
        let mut pages = split_pages(&source, &builder);
        assert_eq!(pages.size_hint(), (2, Some(2)));
        let _ = pages.next();
        assert_eq!(pages.size_hint(), (1, Some(1)));
    }
}
