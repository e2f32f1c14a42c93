// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Feature sessions — one per screen of the app (merge, split, reorder,
// compress, workspace).
//
// A session owns its page set and the raw bytes of its inputs. Sources are
// parsed inside each build and dropped with it, so every parsed document
// belongs to exactly one operation.

pub mod compress;
pub mod guard;
pub mod merge;
pub mod reorder;
pub mod split;
pub mod workspace;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use prism_core::error::{PrismError, Result};
use prism_core::types::{FileId, PageRef};
use prism_document::{PageSetBuilder, SourceDocument};
use tracing::{info, instrument};

use crate::services::app_services::{AppServices, run_blocking};

/// Where an input file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    /// A workspace record, written `ws:<uuid>` on the command line.
    Workspace(FileId),
}

impl FromStr for InputSource {
    type Err = PrismError;

    fn from_str(text: &str) -> Result<Self> {
        match text.strip_prefix("ws:") {
            Some(id) => FileId::parse(id).map(Self::Workspace),
            None => Ok(Self::File(PathBuf::from(text))),
        }
    }
}

/// An input file's bytes, validated as a PDF when loaded.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: String,
    pub bytes: Arc<Vec<u8>>,
    pub page_count: usize,
}

impl LoadedFile {
    /// Validate `bytes` as a PDF and count its pages.
    pub async fn from_bytes(name: String, bytes: Vec<u8>) -> Result<Self> {
        let bytes = Arc::new(bytes);
        let page_count = {
            let (name, bytes) = (name.clone(), Arc::clone(&bytes));
            run_blocking(move || SourceDocument::from_bytes(name, &bytes).map(|doc| doc.page_count()))
                .await?
        };
        Ok(Self {
            name,
            bytes,
            page_count,
        })
    }

    fn parse(&self) -> Result<SourceDocument> {
        SourceDocument::from_bytes(self.name.clone(), &self.bytes)
    }
}

/// Read an input from the filesystem or the workspace.
#[instrument(skip(services))]
pub async fn load_input(services: &AppServices, source: &InputSource) -> Result<LoadedFile> {
    let (name, bytes) = match source {
        InputSource::File(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| PrismError::SourceRead(format!("{}: {e}", path.display())))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document.pdf".into());
            (name, bytes)
        }
        InputSource::Workspace(id) => {
            let missing = || PrismError::SourceRead(format!("workspace file {id} not found"));
            let meta = services.workspace_meta(*id).await?.ok_or_else(missing)?;
            let bytes = services.workspace_content(*id).await?.ok_or_else(missing)?;
            (meta.name, bytes)
        }
    };

    let file = LoadedFile::from_bytes(name, bytes).await?;
    info!(name = %file.name, pages = file.page_count, "input loaded");
    Ok(file)
}

/// Builder configured from the current settings.
pub(crate) fn configured_builder(services: &AppServices) -> PageSetBuilder {
    PageSetBuilder::from_config(&services.config())
}

/// Parse `files` and build `pages` from them in one blocking step. The
/// parsed sources are dropped as soon as the output bytes exist.
pub(crate) async fn build_pages(builder: PageSetBuilder, files: Vec<LoadedFile>, pages: Vec<PageRef>) -> Result<Vec<u8>> {
    run_blocking(move || {
        let sources = files.iter().map(LoadedFile::parse).collect::<Result<Vec<_>>>()?;
        builder.build(&pages, &sources)
    })
    .await
}

#[cfg(test)]
pub(crate) mod testing {
    use prism_core::AppConfig;
    use prism_store::MemoryStore;

    use crate::services::app_services::AppServices;

    /// Services over an in-memory workspace.
    pub fn services() -> AppServices {
        AppServices::with_store(
            Box::new(MemoryStore::new()),
            std::env::temp_dir(),
            AppConfig::default(),
        )
    }
}
