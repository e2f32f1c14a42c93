// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Prism.

use thiserror::Error;

/// Top-level error type for all Prism operations.
///
/// Every variant is recoverable: the caller reports it and the user can retry
/// the same action.
#[derive(Debug, Error)]
pub enum PrismError {
    // -- Document errors --
    #[error("could not read source file: {0}")]
    SourceRead(String),

    #[error("not a valid PDF document: {0}")]
    Parse(String),

    #[error("page index {index} out of range (document has {page_count} pages)")]
    PageIndex { index: usize, page_count: usize },

    #[error("failed to produce output: {0}")]
    Serialize(String),

    #[error("rotation must be a multiple of 90, got {0}")]
    InvalidRotation(i64),

    // -- Page-set preconditions --
    #[error("nothing to build: the page set is empty")]
    EmptyPageSet,

    #[error("at least {required} files are needed, got {actual}")]
    NotEnoughSources { required: usize, actual: usize },

    #[error("another operation is still running")]
    Busy,

    // -- Rendering --
    #[error("page rendering is not available in this build")]
    RenderUnavailable,

    #[error("page rendering failed: {0}")]
    Render(String),

    // -- Storage / persistence --
    #[error("workspace storage error: {0}")]
    Storage(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Task(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrismError>;
