// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge — combine whole files in a user-chosen order.

use prism_core::error::{PrismError, Result};
use prism_core::page_set::{Keyed, OrderedList, PageSet};
use prism_core::types::{PDF_MIME, SourceKey};
use tracing::{info, instrument};
use uuid::Uuid;

use super::guard::InFlight;
use super::{InputSource, LoadedFile, build_pages, configured_builder, load_input};
use crate::services::app_services::{AppServices, Artifact, Delivered, Destination};

/// Fewest files a merge accepts.
pub const MIN_MERGE_FILES: usize = 2;

/// Stable identity of a file in the merge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeFileId(Uuid);

impl std::fmt::Display for MergeFileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One file in the merge list.
#[derive(Debug, Clone)]
pub struct MergeFile {
    pub id: MergeFileId,
    pub file: LoadedFile,
}

impl Keyed for MergeFile {
    type Key = MergeFileId;

    fn key(&self) -> MergeFileId {
        self.id
    }
}

/// The merge screen: an ordered list of files.
pub struct MergeSession {
    services: AppServices,
    files: OrderedList<MergeFile>,
    in_flight: InFlight,
}

impl MergeSession {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            files: OrderedList::new(),
            in_flight: InFlight::new(),
        }
    }

    /// Load and append an input.
    pub async fn add(&mut self, source: &InputSource) -> Result<MergeFileId> {
        let file = load_input(&self.services, source).await?;
        Ok(self.add_loaded(file))
    }

    /// Append an already loaded file.
    pub fn add_loaded(&mut self, file: LoadedFile) -> MergeFileId {
        let id = MergeFileId(Uuid::new_v4());
        self.files.push(MergeFile { id, file });
        id
    }

    pub fn move_file(&mut self, id: MergeFileId, to_index: usize) -> bool {
        self.files.move_to(id, to_index)
    }

    pub fn remove(&mut self, id: MergeFileId) -> bool {
        self.files.remove(id).is_some()
    }

    pub fn files(&self) -> &OrderedList<MergeFile> {
        &self.files
    }

    pub fn can_merge(&self) -> bool {
        self.files.len() >= MIN_MERGE_FILES && !self.in_flight.is_busy()
    }

    /// Every page of every file, files in list order.
    pub fn page_set(&self) -> PageSet {
        let mut pages = PageSet::new();
        for (key, entry) in self.files.iter().enumerate() {
            pages.append_source(SourceKey(key), entry.file.page_count);
        }
        pages
    }

    /// Merge the files and deliver `merged.pdf`.
    #[instrument(skip(self), fields(files = self.files.len()))]
    pub async fn merge(&self, destination: &Destination) -> Result<Delivered> {
        let _ticket = self.in_flight.try_begin("merge")?;

        if self.files.len() < MIN_MERGE_FILES {
            return Err(PrismError::NotEnoughSources {
                required: MIN_MERGE_FILES,
                actual: self.files.len(),
            });
        }

        let pages = self.page_set().into_vec();
        let files: Vec<LoadedFile> = self.files.iter().map(|entry| entry.file.clone()).collect();
        let page_count = pages.len();

        let bytes = build_pages(configured_builder(&self.services), files, pages).await?;
        let name = self.services.config().names.merged;

        let delivered = self
            .services
            .deliver(Artifact::new(name, PDF_MIME, bytes), destination)
            .await?;
        info!(pages = page_count, "merge complete");
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use prism_document::sample;

    use super::*;
    use crate::features::testing;

    async fn loaded(prefix: &str, pages: usize) -> LoadedFile {
        LoadedFile::from_bytes(format!("{prefix}.pdf"), sample::labelled_pdf(prefix, pages))
            .await
            .expect("load")
    }

    async fn stored_bytes(services: &AppServices, delivered: Delivered) -> Vec<u8> {
        let Delivered::Stored(meta) = delivered else {
            panic!("expected a workspace delivery");
        };
        services
            .workspace_content(meta.id)
            .await
            .expect("get")
            .expect("present")
    }

    #[tokio::test]
    async fn merges_files_in_list_order() {
        let services = testing::services();
        let mut session = MergeSession::new(services.clone());
        let a = session.add_loaded(loaded("a", 2).await);
        session.add_loaded(loaded("b", 3).await);
        session.move_file(a, 1);

        let delivered = session.merge(&Destination::Workspace).await.expect("merge");
        let bytes = stored_bytes(&services, delivered).await;
        assert_eq!(
            sample::page_labels(&bytes).expect("labels"),
            vec!["b1", "b2", "b3", "a1", "a2"]
        );

        let listed = services.list_workspace().await.expect("list");
        assert_eq!(listed[0].name, "merged.pdf");
        assert_eq!(listed[0].mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn single_file_is_not_enough() {
        let mut session = MergeSession::new(testing::services());
        session.add_loaded(loaded("a", 1).await);
        assert!(!session.can_merge());

        let result = session.merge(&Destination::Workspace).await;
        assert!(matches!(
            result,
            Err(PrismError::NotEnoughSources { required: 2, actual: 1 })
        ));
    }

    #[tokio::test]
    async fn removing_a_file_drops_its_pages() {
        let mut session = MergeSession::new(testing::services());
        session.add_loaded(loaded("a", 2).await);
        let b = session.add_loaded(loaded("b", 2).await);
        session.add_loaded(loaded("c", 1).await);

        assert!(session.remove(b));
        assert!(!session.remove(b));
        assert_eq!(session.page_set().len(), 3);
    }

    #[tokio::test]
    async fn double_trigger_yields_one_artifact() {
        let services = testing::services();
        let mut session = MergeSession::new(services.clone());
        session.add_loaded(loaded("a", 2).await);
        session.add_loaded(loaded("b", 2).await);

        let (first, second) = tokio::join!(
            session.merge(&Destination::Workspace),
            session.merge(&Destination::Workspace)
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(PrismError::Busy)));
        assert_eq!(services.list_workspace().await.expect("list").len(), 1);

        // The guard is released afterwards.
        session.merge(&Destination::Workspace).await.expect("third merge");
    }
}
