// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Workspace — list, import, export and delete stored files.

use std::path::Path;

use prism_core::error::{PrismError, Result};
use prism_core::types::{FileId, StoredFileMeta};
use tracing::{info, instrument};

use crate::services::app_services::{AppServices, Artifact, Delivered, Destination};

/// Everything in the workspace, newest first.
pub async fn list(services: &AppServices) -> Result<Vec<StoredFileMeta>> {
    services.list_workspace().await
}

/// Copy a file from disk into the workspace under its own name.
#[instrument(skip(services))]
pub async fn import(services: &AppServices, path: &Path) -> Result<StoredFileMeta> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PrismError::SourceRead(format!("{}: {e}", path.display())))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| PrismError::SourceRead(format!("{} has no file name", path.display())))?;

    let meta = services
        .save_to_workspace(name.clone(), mime_for(&name), bytes)
        .await?;
    info!(id = %meta.id, size = meta.size, "imported");
    Ok(meta)
}

fn mime_for(name: &str) -> String {
    prism_core::types::mime_for_name(name).to_string()
}

/// Write a stored file to `target` (a file path, or a directory that
/// receives it under its stored name).
#[instrument(skip(services))]
pub async fn export(services: &AppServices, id: FileId, target: &Path) -> Result<Delivered> {
    let missing = || PrismError::Storage(format!("workspace file {id} not found"));
    let meta = services.workspace_meta(id).await?.ok_or_else(missing)?;
    let bytes = services.workspace_content(id).await?.ok_or_else(missing)?;

    services
        .deliver(
            Artifact::new(meta.name, meta.mime_type, bytes),
            &Destination::Download(target.to_path_buf()),
        )
        .await
}

/// Remove a stored file. Unknown ids are ignored.
pub async fn delete(services: &AppServices, id: FileId) -> Result<()> {
    services.delete_from_workspace(id).await?;
    info!(%id, "deleted from workspace");
    Ok(())
}

#[cfg(test)]
mod tests {
    use prism_document::sample;

    use super::*;
    use crate::features::testing;

    #[tokio::test]
    async fn import_export_and_delete() {
        let services = testing::services();
        let dir = tempfile::tempdir().expect("tempdir");
        let original = dir.path().join("scan.pdf");
        let pdf = sample::sample_pdf(2);
        tokio::fs::write(&original, &pdf).await.expect("write");

        let meta = import(&services, &original).await.expect("import");
        assert_eq!(meta.name, "scan.pdf");
        assert_eq!(meta.mime_type, "application/pdf");
        assert_eq!(meta.size, pdf.len() as u64);

        let out_dir = dir.path().join("out");
        tokio::fs::create_dir(&out_dir).await.expect("mkdir");
        let delivered = export(&services, meta.id, &out_dir).await.expect("export");
        assert_eq!(delivered, Delivered::Downloaded(out_dir.join("scan.pdf")));
        assert_eq!(tokio::fs::read(out_dir.join("scan.pdf")).await.expect("read"), pdf);

        delete(&services, meta.id).await.expect("delete");
        assert!(list(&services).await.expect("list").is_empty());
        delete(&services, meta.id).await.expect("second delete is a no-op");
    }

    #[tokio::test]
    async fn import_infers_mime_from_name() {
        let services = testing::services();
        let dir = tempfile::tempdir().expect("tempdir");
        let notes = dir.path().join("notes.txt");
        tokio::fs::write(&notes, b"hello").await.expect("write");

        let meta = import(&services, &notes).await.expect("import");
        assert_eq!(meta.mime_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn exporting_unknown_file_fails() {
        let services = testing::services();
        let dir = tempfile::tempdir().expect("tempdir");
        let result = export(&services, FileId::new(), dir.path()).await;
        assert!(matches!(result, Err(PrismError::Storage(_))));
    }
}
