// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — opens the workspace store, owns the configuration,
// and delivers finished artifacts to their destination.
//
// The SQLite store is `Send` but not `Sync`, so it is wrapped in
// `Arc<Mutex<>>` and only ever touched from `spawn_blocking` tasks. Mutex
// contention is minimal because operations are strictly sequential.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use prism_core::error::{PrismError, Result};
use prism_core::types::{FileId, StoredFileMeta};
use prism_core::{AppConfig, Notice};
use prism_store::{MemoryStore, SqliteStore, WorkspaceStore};
use tracing::{debug, error, info, instrument, warn};

/// Workspace database file name inside the data directory.
const WORKSPACE_DB: &str = "workspace.db";

/// Config file name inside the data directory.
const CONFIG_FILE: &str = "config.json";

type SharedStore = Arc<Mutex<Box<dyn WorkspaceStore + Send>>>;

/// Run blocking work (SQLite, document parsing and building) off the runtime
/// thread and wait for it.
pub async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PrismError::Task(e.to_string()))?
}

/// Finished output bytes waiting for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Where a finished artifact goes. Every output goes to exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Write to the filesystem. A directory receives the artifact under its
    /// own name.
    Download(PathBuf),
    /// Save as a new workspace record.
    Workspace,
}

/// Outcome of a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered {
    Downloaded(PathBuf),
    Stored(StoredFileMeta),
}

impl Delivered {
    /// Success notice for the notification area.
    pub fn notice(&self) -> Notice {
        match self {
            Delivered::Downloaded(path) => Notice::success(format!("Saved {}", path.display())),
            Delivered::Stored(meta) => {
                Notice::success(format!("Saved {} to workspace ({})", meta.name, meta.id))
            }
        }
    }
}

/// Shared application services, handed to every feature session.
///
/// All fields are cheaply cloneable (Arc-wrapped) so that the struct can be
/// moved into blocking tasks without lifetime issues.
#[derive(Clone)]
pub struct AppServices {
    workspace: SharedStore,
    data_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
}

impl AppServices {
    /// Initialise all services.  Call once at startup.
    ///
    /// Opens the workspace database and loads the persisted config.
    pub async fn init(data_dir: PathBuf) -> Result<Self> {
        info!(path = %data_dir.display(), "initialising app services");

        let db_path = data_dir.join(WORKSPACE_DB);
        let store = run_blocking(move || SqliteStore::open(db_path)).await?;
        let config = load_config(&data_dir).await.unwrap_or_default();

        info!("app services initialised");
        Ok(Self::with_store(Box::new(store), data_dir, config))
    }

    /// Services backed by an in-memory workspace, for when the database
    /// cannot be opened. Saved files last until the process exits.
    pub async fn fallback(data_dir: PathBuf) -> Self {
        error!("workspace database unavailable, files saved this session will not persist");
        let config = load_config(&data_dir).await.unwrap_or_default();
        Self::with_store(Box::new(MemoryStore::new()), data_dir, config)
    }

    /// Services over an injected store.
    pub fn with_store(store: Box<dyn WorkspaceStore + Send>, data_dir: PathBuf, config: AppConfig) -> Self {
        Self {
            workspace: Arc::new(Mutex::new(store)),
            data_dir,
            config: Arc::new(Mutex::new(config)),
        }
    }

    // -- Workspace -----------------------------------------------------------

    async fn with_workspace<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&dyn WorkspaceStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.workspace);
        run_blocking(move || {
            let guard = store
                .lock()
                .map_err(|_| PrismError::Storage("workspace lock poisoned".into()))?;
            work(&**guard)
        })
        .await
    }

    /// Save bytes as a new workspace record.
    pub async fn save_to_workspace(&self, name: String, mime_type: String, bytes: Vec<u8>) -> Result<StoredFileMeta> {
        self.with_workspace(move |store| store.save(&name, &mime_type, &bytes))
            .await
    }

    /// Workspace contents, newest first.
    pub async fn list_workspace(&self) -> Result<Vec<StoredFileMeta>> {
        self.with_workspace(|store| store.list()).await
    }

    pub async fn workspace_meta(&self, id: FileId) -> Result<Option<StoredFileMeta>> {
        self.with_workspace(move |store| store.get_meta(&id)).await
    }

    pub async fn workspace_content(&self, id: FileId) -> Result<Option<Vec<u8>>> {
        self.with_workspace(move |store| store.get_content(&id)).await
    }

    pub async fn delete_from_workspace(&self, id: FileId) -> Result<()> {
        self.with_workspace(move |store| store.delete(&id)).await
    }

    // -- Delivery ------------------------------------------------------------

    /// Send a finished artifact to its destination.
    ///
    /// Downloads are written next to the target under a `.part` name and
    /// renamed into place, so a failed write never leaves a partial file
    /// under the final name.
    #[instrument(skip(self, artifact), fields(name = %artifact.name, bytes_len = artifact.bytes.len()))]
    pub async fn deliver(&self, artifact: Artifact, destination: &Destination) -> Result<Delivered> {
        match destination {
            Destination::Workspace => {
                let meta = self
                    .save_to_workspace(artifact.name, artifact.mime_type, artifact.bytes)
                    .await?;
                Ok(Delivered::Stored(meta))
            }
            Destination::Download(target) => {
                let path = if tokio::fs::metadata(target).await.is_ok_and(|m| m.is_dir()) {
                    target.join(&artifact.name)
                } else {
                    target.clone()
                };
                write_atomically(&path, &artifact.bytes).await?;
                info!(path = %path.display(), "artifact written");
                Ok(Delivered::Downloaded(path))
            }
        }
    }

    // -- Config --------------------------------------------------------------

    /// Snapshot of the current configuration.
    pub fn config(&self) -> AppConfig {
        match self.config.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the configuration and persist it.
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        {
            let mut guard = self
                .config
                .lock()
                .map_err(|_| PrismError::Storage("config lock poisoned".into()))?;
            *guard = config.clone();
        }
        persist_config(&self.data_dir, config).await
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    if let Err(err) = tokio::fs::write(&part, bytes).await {
        tokio::fs::remove_file(&part).await.ok();
        return Err(err.into());
    }
    if let Err(err) = tokio::fs::rename(&part, path).await {
        tokio::fs::remove_file(&part).await.ok();
        return Err(err.into());
    }
    debug!(path = %path.display(), "renamed into place");
    Ok(())
}

async fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = tokio::fs::read_to_string(&path).await.ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

async fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    write_atomically(&data_dir.join(CONFIG_FILE), json.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use prism_core::Severity;

    use super::*;

    fn memory_services(dir: &Path) -> AppServices {
        AppServices::with_store(Box::new(MemoryStore::new()), dir.to_path_buf(), AppConfig::default())
    }

    #[tokio::test]
    async fn workspace_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = memory_services(dir.path());

        let meta = services
            .save_to_workspace("a.pdf".into(), "application/pdf".into(), b"pdf".to_vec())
            .await
            .expect("save");
        assert_eq!(services.list_workspace().await.expect("list"), vec![meta.clone()]);
        assert_eq!(
            services.workspace_content(meta.id).await.expect("get"),
            Some(b"pdf".to_vec())
        );

        services.delete_from_workspace(meta.id).await.expect("delete");
        assert_eq!(services.workspace_content(meta.id).await.expect("get"), None);
    }

    #[tokio::test]
    async fn download_leaves_no_part_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = memory_services(dir.path());
        let target = dir.path().join("out.pdf");

        let delivered = services
            .deliver(Artifact::new("merged.pdf", "application/pdf", b"bytes".to_vec()), &Destination::Download(target.clone()))
            .await
            .expect("deliver");

        assert_eq!(delivered, Delivered::Downloaded(target.clone()));
        assert_eq!(std::fs::read(&target).expect("read"), b"bytes");
        assert!(!dir.path().join("out.pdf.part").exists());
        assert!(services.list_workspace().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn download_into_directory_uses_artifact_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = memory_services(dir.path());

        let delivered = services
            .deliver(
                Artifact::new("split-pages.zip", "application/zip", b"PK".to_vec()),
                &Destination::Download(dir.path().to_path_buf()),
            )
            .await
            .expect("deliver");

        assert_eq!(delivered, Delivered::Downloaded(dir.path().join("split-pages.zip")));
    }

    #[tokio::test]
    async fn workspace_delivery_saves_one_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = memory_services(dir.path());

        let delivered = services
            .deliver(Artifact::new("organized.pdf", "application/pdf", b"x".to_vec()), &Destination::Workspace)
            .await
            .expect("deliver");

        let listed = services.list_workspace().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(delivered, Delivered::Stored(listed[0].clone()));
        assert_eq!(delivered.notice().severity, Severity::Success);
    }

    #[tokio::test]
    async fn download_to_missing_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = memory_services(dir.path());
        let target = dir.path().join("missing").join("out.pdf");

        let result = services
            .deliver(Artifact::new("x.pdf", "application/pdf", vec![1]), &Destination::Download(target))
            .await;
        assert!(matches!(result, Err(PrismError::Io(_))));
    }

    #[tokio::test]
    async fn config_persists_across_init() {
        let dir = tempfile::tempdir().expect("tempdir");
        let services = AppServices::init(dir.path().to_path_buf()).await.expect("init");

        let mut config = services.config();
        config.compress_outputs = true;
        services.save_config(&config).await.expect("save config");

        let reopened = AppServices::init(dir.path().to_path_buf()).await.expect("reinit");
        assert!(reopened.config().compress_outputs);
        assert!(reopened.config_path().exists());
    }

    #[tokio::test]
    async fn unreadable_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        tokio::fs::write(dir.path().join(CONFIG_FILE), "{ not json").await.expect("write");

        let services = AppServices::fallback(dir.path().to_path_buf()).await;
        assert_eq!(services.config(), AppConfig::default());
    }
}
