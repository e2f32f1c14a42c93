// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Split — pick pages out of one document, or split every page into its own
// file.

use std::sync::Arc;

use prism_core::error::{PrismError, Result};
use prism_core::page_set::PageSelection;
use prism_core::types::{PDF_MIME, SourceKey, ZIP_MIME};
use prism_document::render::{PageRasterizer, Thumbnail, render_thumbnails};
use prism_document::split_all_to_archive;
use tracing::{info, instrument};

use super::guard::{Epoch, InFlight};
use super::{InputSource, LoadedFile, build_pages, configured_builder, load_input};
use crate::services::app_services::{AppServices, Artifact, Delivered, Destination, run_blocking};

/// The split screen: one source document and a page selection over it.
pub struct SplitSession {
    services: AppServices,
    source: Option<LoadedFile>,
    selection: PageSelection,
    extract_guard: InFlight,
    split_guard: InFlight,
    epoch: Epoch,
}

impl SplitSession {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            source: None,
            selection: PageSelection::default(),
            extract_guard: InFlight::new(),
            split_guard: InFlight::new(),
            epoch: Epoch::new(),
        }
    }

    /// Load a document, replacing any previous one and its selection.
    pub async fn load(&mut self, input: &InputSource) -> Result<usize> {
        let file = load_input(&self.services, input).await?;
        Ok(self.load_file(file))
    }

    pub fn load_file(&mut self, file: LoadedFile) -> usize {
        self.epoch.advance();
        let pages = file.page_count;
        self.selection = PageSelection::new(pages);
        self.source = Some(file);
        pages
    }

    /// Leave the screen. Results still in flight are discarded.
    pub fn close(&mut self) {
        self.epoch.advance();
        self.source = None;
        self.selection = PageSelection::default();
    }

    pub fn source(&self) -> Option<&LoadedFile> {
        self.source.as_ref()
    }

    /// Toggle a zero-based page index; returns whether it is now selected.
    pub fn toggle(&mut self, index: usize) -> bool {
        self.selection.toggle(index)
    }

    pub fn selection(&self) -> &PageSelection {
        &self.selection
    }

    pub fn can_extract(&self) -> bool {
        self.source.is_some() && !self.selection.is_empty() && !self.extract_guard.is_busy()
    }

    fn loaded(&self) -> Result<&LoadedFile> {
        self.source
            .as_ref()
            .ok_or_else(|| PrismError::SourceRead("no document loaded".into()))
    }

    /// Render the selection grid. Returns `None` when the session moved on
    /// (another file loaded, or closed) before rendering finished.
    #[instrument(skip_all)]
    pub async fn thumbnails(&self, rasterizer: Arc<dyn PageRasterizer>) -> Result<Option<Vec<Thumbnail>>> {
        let file = self.loaded()?.clone();
        let scale = self.services.config().split_thumbnail_scale;

        let stamped = self.epoch.stamp(());
        let thumbnails = run_blocking(move || render_thumbnails(rasterizer.as_ref(), &file.bytes, scale)).await?;
        Ok(self.epoch.accept(stamped).map(|()| thumbnails))
    }

    /// Build a document from the selected pages, in document order, and
    /// deliver `extracted.pdf`.
    #[instrument(skip(self), fields(selected = self.selection.len()))]
    pub async fn extract_selected(&self, destination: &Destination) -> Result<Delivered> {
        let _ticket = self.extract_guard.try_begin("extract")?;
        let file = self.loaded()?.clone();
        if self.selection.is_empty() {
            return Err(PrismError::EmptyPageSet);
        }

        let pages = self.selection.to_page_set(SourceKey(0)).into_vec();
        let bytes = build_pages(configured_builder(&self.services), vec![file], pages).await?;
        let name = self.services.config().names.extracted;

        let delivered = self
            .services
            .deliver(Artifact::new(name, PDF_MIME, bytes), destination)
            .await?;
        info!(pages = self.selection.len(), "extraction complete");
        Ok(delivered)
    }

    /// Split every page into its own document and deliver them as one ZIP.
    #[instrument(skip(self))]
    pub async fn split_all(&self, destination: &Destination) -> Result<Delivered> {
        let _ticket = self.split_guard.try_begin("split_all")?;
        let file = self.loaded()?.clone();
        let builder = configured_builder(&self.services);

        let archive = run_blocking(move || {
            let source = file.parse()?;
            split_all_to_archive(&source, &builder)
        })
        .await?;
        let name = self.services.config().names.split_archive;

        self.services
            .deliver(Artifact::new(name, ZIP_MIME, archive), destination)
            .await
    }
}
