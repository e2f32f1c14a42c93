// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reorder — rearrange, rotate, duplicate and delete pages, then save the
// result as a new document.

use std::sync::Arc;

use prism_core::error::{PrismError, Result};
use prism_core::page_set::PageSet;
use prism_core::types::{PDF_MIME, PageRefId, Rotation, SourceKey};
use prism_document::render::{PageRasterizer, Thumbnail, render_thumbnails};
use tracing::{debug, info, instrument};

use super::guard::{Epoch, InFlight};
use super::{InputSource, LoadedFile, build_pages, configured_builder, load_input};
use crate::services::app_services::{AppServices, Artifact, Delivered, Destination, run_blocking};

/// The reorder screen.
pub struct ReorderSession {
    services: AppServices,
    /// Loaded inputs; a page's `SourceKey` is its position here.
    sources: Vec<LoadedFile>,
    pages: PageSet,
    in_flight: InFlight,
    epoch: Epoch,
}

impl ReorderSession {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            sources: Vec::new(),
            pages: PageSet::new(),
            in_flight: InFlight::new(),
            epoch: Epoch::new(),
        }
    }

    /// Start over with one document, one page per source page.
    pub async fn load(&mut self, input: &InputSource) -> Result<usize> {
        let file = load_input(&self.services, input).await?;
        self.epoch.advance();
        self.sources.clear();
        self.pages.clear();
        Ok(self.append_file(file))
    }

    /// Append the pages of another document.
    pub async fn add_source(&mut self, input: &InputSource) -> Result<usize> {
        let file = load_input(&self.services, input).await?;
        Ok(self.append_file(file))
    }

    pub fn append_file(&mut self, file: LoadedFile) -> usize {
        let key = SourceKey(self.sources.len());
        let pages = file.page_count;
        self.pages.append_source(key, pages);
        self.sources.push(file);
        pages
    }

    /// Leave the screen. Results still in flight are discarded.
    pub fn close(&mut self) {
        self.epoch.advance();
        self.sources.clear();
        self.pages.clear();
    }

    pub fn pages(&self) -> &PageSet {
        &self.pages
    }

    // -- Edits ---------------------------------------------------------------

    pub fn move_page(&mut self, id: PageRefId, to_index: usize) -> bool {
        self.pages.move_to(id, to_index)
    }

    /// Drop `active` onto the slot held by `over`.
    pub fn drop_onto(&mut self, active: PageRefId, over: PageRefId) -> bool {
        self.pages.move_onto(active, over)
    }

    pub fn rotate(&mut self, id: PageRefId) -> Option<Rotation> {
        self.pages.toggle_rotate(id)
    }

    pub fn remove(&mut self, id: PageRefId) -> bool {
        self.pages.remove(id).is_some()
    }

    pub fn duplicate(&mut self, id: PageRefId) -> Option<PageRefId> {
        self.pages.duplicate(id)
    }

    /// Rearrange the first document's pages to `order`, given as 1-based
    /// page numbers. Pages left out are removed and pages listed more than
    /// once are duplicated.
    pub fn apply_order(&mut self, order: &[usize]) -> Result<()> {
        let originals: Vec<PageRefId> = self
            .pages
            .iter()
            .filter(|page| page.source == SourceKey(0))
            .map(|page| page.id)
            .collect();

        let indices = order
            .iter()
            .map(|&number| {
                number
                    .checked_sub(1)
                    .filter(|&i| i < originals.len())
                    .ok_or(PrismError::PageIndex {
                        index: number.saturating_sub(1),
                        page_count: originals.len(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut used = vec![false; originals.len()];
        let mut wanted = Vec::with_capacity(indices.len());
        for index in indices {
            if !used[index] {
                used[index] = true;
                wanted.push(originals[index]);
            } else if let Some(copy) = self.pages.duplicate(originals[index]) {
                wanted.push(copy);
            }
        }

        for (id, _) in originals.iter().zip(&used).filter(|(_, used)| !**used) {
            self.pages.remove(*id);
        }
        for (position, id) in wanted.iter().enumerate() {
            self.pages.move_to(*id, position);
        }

        debug!(pages = self.pages.len(), "order applied");
        Ok(())
    }

    /// Saving needs at least one page.
    pub fn can_save(&self) -> bool {
        !self.pages.is_empty() && !self.in_flight.is_busy()
    }

    // -- Output --------------------------------------------------------------

    /// Render every loaded source, indexed by `SourceKey`. Returns `None`
    /// when the session moved on before rendering finished.
    #[instrument(skip_all, fields(sources = self.sources.len()))]
    pub async fn thumbnails(&self, rasterizer: Arc<dyn PageRasterizer>) -> Result<Option<Vec<Vec<Thumbnail>>>> {
        let files = self.sources.clone();
        let scale = self.services.config().reorder_thumbnail_scale;

        let stamped = self.epoch.stamp(());
        let rendered = run_blocking(move || {
            files
                .iter()
                .map(|file| render_thumbnails(rasterizer.as_ref(), &file.bytes, scale))
                .collect::<Result<Vec<_>>>()
        })
        .await?;
        Ok(self.epoch.accept(stamped).map(|()| rendered))
    }

    /// Build the page set as it stands and deliver `organized.pdf`.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub async fn save(&self, destination: &Destination) -> Result<Delivered> {
        let _ticket = self.in_flight.try_begin("reorder_save")?;
        if self.pages.is_empty() {
            return Err(PrismError::EmptyPageSet);
        }

        let pages = self.pages.as_slice().to_vec();
        let bytes = build_pages(configured_builder(&self.services), self.sources.clone(), pages).await?;
        let name = self.services.config().names.organized;

        let delivered = self
            .services
            .deliver(Artifact::new(name, PDF_MIME, bytes), destination)
            .await?;
        info!(pages = self.pages.len(), "reordered document saved");
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use prism_document::sample;

    use super::*;
    use crate::features::testing;

    async fn session_with(pages: usize) -> (AppServices, ReorderSession) {
        let services = testing::services();
        let mut session = ReorderSession::new(services.clone());
        let file = LoadedFile::from_bytes("doc.pdf".into(), sample::sample_pdf(pages))
            .await
            .expect("load");
        session.append_file(file);
        (services, session)
    }

    async fn saved(services: &AppServices, session: &ReorderSession) -> Vec<u8> {
        let Delivered::Stored(meta) = session.save(&Destination::Workspace).await.expect("save") else {
            panic!("expected a workspace delivery");
        };
        assert_eq!(meta.name, "organized.pdf");
        services
            .workspace_content(meta.id)
            .await
            .expect("get")
            .expect("present")
    }

    fn ids(session: &ReorderSession) -> Vec<PageRefId> {
        session.pages().iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn edits_are_reflected_in_saved_document() {
        let (services, mut session) = session_with(4).await;
        let ids = ids(&session);

        session.move_page(ids[3], 0);
        session.remove(ids[1]);
        session.rotate(ids[2]);

        let bytes = saved(&services, &session).await;
        assert_eq!(sample::page_labels(&bytes).expect("labels"), vec!["p4", "p1", "p3"]);
        assert_eq!(sample::page_rotations(&bytes).expect("rotations"), vec![0, 0, 90]);
    }

    #[tokio::test]
    async fn duplicates_keep_their_own_rotation() {
        let (services, mut session) = session_with(2).await;
        let first = ids(&session)[0];
        let copy = session.duplicate(first).expect("duplicate");
        session.rotate(copy);
        session.rotate(copy);

        let bytes = saved(&services, &session).await;
        assert_eq!(sample::page_labels(&bytes).expect("labels"), vec!["p1", "p1", "p2"]);
        assert_eq!(sample::page_rotations(&bytes).expect("rotations"), vec![0, 180, 0]);
    }

    #[tokio::test]
    async fn removing_every_page_disables_save() {
        let (services, mut session) = session_with(2).await;
        for id in ids(&session) {
            session.remove(id);
        }
        assert!(!session.can_save());

        let result = session.save(&Destination::Workspace).await;
        assert!(matches!(result, Err(PrismError::EmptyPageSet)));
        assert!(services.list_workspace().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn apply_order_moves_drops_and_duplicates() {
        let (services, mut session) = session_with(4).await;
        session.apply_order(&[3, 1, 3]).expect("order");

        let bytes = saved(&services, &session).await;
        assert_eq!(sample::page_labels(&bytes).expect("labels"), vec!["p3", "p1", "p3"]);
    }

    #[tokio::test]
    async fn apply_order_rejects_unknown_pages() {
        let (_, mut session) = session_with(2).await;
        let before = ids(&session);
        assert!(matches!(
            session.apply_order(&[1, 5]),
            Err(PrismError::PageIndex { index: 4, page_count: 2 })
        ));
        assert!(session.apply_order(&[0]).is_err());
        assert_eq!(ids(&session), before);
    }

    #[tokio::test]
    async fn pages_from_several_documents() {
        let services = testing::services();
        let mut session = ReorderSession::new(services.clone());
        for prefix in ["a", "b"] {
            let file = LoadedFile::from_bytes(format!("{prefix}.pdf"), sample::labelled_pdf(prefix, 2))
                .await
                .expect("load");
            session.append_file(file);
        }
        let ids = ids(&session);
        session.drop_onto(ids[3], ids[0]);

        let bytes = saved(&services, &session).await;
        assert_eq!(
            sample::page_labels(&bytes).expect("labels"),
            vec!["b2", "a1", "a2", "b1"]
        );
    }

    #[tokio::test]
    async fn double_save_yields_one_artifact() {
        let (services, session) = session_with(3).await;
        let (first, second) = tokio::join!(
            session.save(&Destination::Workspace),
            session.save(&Destination::Workspace)
        );
        assert!(first.is_ok());
        assert!(matches!(second, Err(PrismError::Busy)));
        assert_eq!(services.list_workspace().await.expect("list").len(), 1);
    }
}
