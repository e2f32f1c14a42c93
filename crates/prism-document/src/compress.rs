// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Size optimisation for finished documents.

use lopdf::Document;
use prism_core::error::{PrismError, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Before/after sizes of one optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompressReport {
    pub original_size: usize,
    pub optimized_size: usize,
    /// Percentage saved, rounded. Negative when the output grew.
    pub reduction_percent: i64,
}

impl CompressReport {
    pub fn new(original_size: usize, optimized_size: usize) -> Self {
        let reduction_percent = if original_size == 0 {
            0
        } else {
            let saved = original_size as f64 - optimized_size as f64;
            (saved / original_size as f64 * 100.0).round() as i64
        };
        Self {
            original_size,
            optimized_size,
            reduction_percent,
        }
    }
}

/// Rewrite a PDF as small as lopdf can make it without touching content:
/// unreferenced objects are dropped, empty streams removed, remaining streams
/// flate-compressed and objects renumbered.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn optimize(data: &[u8]) -> Result<(Vec<u8>, CompressReport)> {
    let mut document =
        Document::load_mem(data).map_err(|e| PrismError::Parse(format!("cannot optimise: {e}")))?;

    let pruned = document.prune_objects();
    let emptied = document.delete_zero_length_streams();
    document.compress();
    document.renumber_objects();

    debug!(pruned = pruned.len(), emptied = emptied.len(), "objects removed");

    let mut output = Vec::new();
    document
        .save_to(&mut output)
        .map_err(|e| PrismError::Serialize(format!("failed to write optimised PDF: {e}")))?;

    let report = CompressReport::new(data.len(), output.len());
    info!(
        original = report.original_size,
        optimized = report.optimized_size,
        reduction_percent = report.reduction_percent,
        "document optimised"
    );
    Ok((output, report))
}
