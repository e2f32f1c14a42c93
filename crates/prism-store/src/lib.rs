// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// prism-store — The workspace: durable keyed storage for finished files.
//
// Holds opaque blobs with metadata. It knows nothing about PDF structure.

pub mod integrity;
pub mod memory;
pub mod sqlite;
pub mod workspace;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use workspace::WorkspaceStore;
