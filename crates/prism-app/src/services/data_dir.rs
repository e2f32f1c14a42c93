// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::{Path, PathBuf};

/// Return the application data directory, creating it if needed.
///
/// An explicit directory (the `--data-dir` flag or `$PRISM_DATA_DIR`) wins;
/// otherwise the conventional per-user location.
pub async fn data_dir(explicit: Option<&Path>) -> PathBuf {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => dirs_fallback().join("prism"),
    };
    tokio::fs::create_dir_all(&dir).await.ok();
    dir
}

fn dirs_fallback() -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn explicit_directory_is_created() {
        let root = tempfile::tempdir().expect("tempdir");
        let wanted = root.path().join("nested").join("prism");

        let dir = data_dir(Some(&wanted)).await;
        assert_eq!(dir, wanted);
        assert!(dir.is_dir());
    }
}
