// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use serde::{Deserialize, Serialize};

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Render scale for the page-selection grid of the split screen.
    pub split_thumbnail_scale: f32,
    /// Render scale for the reorder grid.
    pub reorder_thumbnail_scale: f32,
    /// PDF header version written on built documents.
    pub output_pdf_version: String,
    /// Run the optimiser over every built document before delivery.
    pub compress_outputs: bool,
    /// File names given to outputs.
    pub names: OutputNames,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            split_thumbnail_scale: 0.5,
            reorder_thumbnail_scale: 0.4,
            output_pdf_version: "1.7".into(),
            compress_outputs: false,
            names: OutputNames::default(),
        }
    }
}

/// Default output names, one per operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputNames {
    pub merged: String,
    pub extracted: String,
    pub organized: String,
    pub split_archive: String,
    /// Prepended to the input name for optimised copies.
    pub optimized_prefix: String,
}

impl Default for OutputNames {
    fn default() -> Self {
        Self {
            merged: "merged.pdf".into(),
            extracted: "extracted.pdf".into(),
            organized: "organized.pdf".into(),
            split_archive: "split-pages.zip".into(),
            optimized_prefix: "optimized-".into(),
        }
    }
}

impl OutputNames {
    pub fn optimized(&self, input_name: &str) -> String {
        format!("{}{}", self.optimized_prefix, input_name)
    }
}
