// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// prism-document — Document work for Prism.
//
// Loads source PDFs, builds new documents from page sets, splits documents
// into single pages and archives them, optimises finished files, and renders
// page previews.

pub mod archive;
pub mod compress;
pub mod pdf;
pub mod render;

#[cfg(any(test, feature = "test-util"))]
pub mod sample;

// Re-export the primary types so callers can use `prism_document::PageSetBuilder` etc.
pub use archive::ZipArchiver;
pub use compress::{CompressReport, optimize};
pub use pdf::{PageResolver, PageSetBuilder, SourceDocument, SplitPage, split_all_to_archive, split_pages};
pub use render::{PageRasterizer, Thumbnail, default_rasterizer, page_count, render_page_to_data_uri, render_thumbnails};
