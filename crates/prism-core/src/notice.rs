// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-facing notices.
//
// Failures never block the user: each error becomes a short, non-blocking
// notice with a plain-language suggestion. Completed operations produce a
// success notice through the same type.

use crate::error::PrismError;

/// How a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation finished.
    Success,
    /// Nothing is wrong with the input; trying again later should work.
    Transient,
    /// The user has to change something first (pick more files, select pages).
    ActionRequired,
    /// Retrying with the same input will fail the same way.
    Permanent,
}

/// A message for the notification area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user can do next (shown as body text). Empty for successes.
    pub suggestion: String,
    /// Whether repeating the action unchanged is worth offering.
    pub retriable: bool,
    pub severity: Severity,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: String::new(),
            retriable: false,
            severity: Severity::Success,
        }
    }
}

/// Convert an error into the notice shown to the user.
pub fn notice_for(err: &PrismError) -> Notice {
    match err {
        PrismError::SourceRead(_) => Notice {
            message: "The file couldn't be read.".into(),
            suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        PrismError::Parse(_) => Notice {
            message: "This doesn't look like a valid PDF.".into(),
            suggestion: "The file may be damaged or in another format. Try a different file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PrismError::PageIndex { .. } => Notice {
            message: "A page no longer exists in its document.".into(),
            suggestion: "Reload the file and arrange the pages again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PrismError::Serialize(_) => Notice {
            message: "The new PDF couldn't be created.".into(),
            suggestion: "Try again. If this keeps happening, one of the input files may be damaged.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PrismError::InvalidRotation(degrees) => Notice {
            message: "Pages can only be turned in quarter turns.".into(),
            suggestion: format!("Use 90, 180 or 270 degrees instead of {degrees}."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PrismError::EmptyPageSet => Notice {
            message: "There are no pages to save.".into(),
            suggestion: "Select or keep at least one page, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PrismError::NotEnoughSources { required, .. } => Notice {
            message: "Not enough files to combine.".into(),
            suggestion: format!("Add at least {required} PDF files, then try again."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PrismError::Busy => Notice {
            message: "Still working on the previous request.".into(),
            suggestion: "Wait for it to finish before starting it again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PrismError::RenderUnavailable => Notice {
            message: "Page previews aren't available.".into(),
            suggestion: "Editing still works; previews need a build with rendering enabled.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PrismError::Render(_) => Notice {
            message: "A page preview couldn't be drawn.".into(),
            suggestion: "The page can still be moved, rotated or removed.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PrismError::Storage(_) => Notice {
            message: "The workspace had a storage problem.".into(),
            suggestion: "Try again. Your saved files should still be there.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PrismError::Integrity { .. } => Notice {
            message: "A saved file has been changed or damaged.".into(),
            suggestion: "Delete it from the workspace and save it again from the original.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PrismError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => Notice {
                message: "The file or folder couldn't be found.".into(),
                suggestion: "Check the location and try again.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => Notice {
                message: "Permission denied.".into(),
                suggestion: "Choose a location you are allowed to write to.".into(),
                retriable: false,
                severity: Severity::ActionRequired,
            },
            _ => Notice {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                retriable: true,
                severity: Severity::Transient,
            },
        },

        PrismError::Serialization(_) => Notice {
            message: "The settings file couldn't be read or written.".into(),
            suggestion: "Defaults are in use. Save your settings again to repair it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PrismError::Task(_) => Notice {
            message: "Something went wrong while working.".into(),
            suggestion: "Try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}
