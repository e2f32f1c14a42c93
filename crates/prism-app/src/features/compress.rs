// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compress — rewrite one document as small as possible.

use prism_core::error::Result;
use prism_core::types::PDF_MIME;
use prism_document::{CompressReport, optimize};
use tracing::{info, instrument};

use super::guard::InFlight;
use super::{InputSource, LoadedFile, load_input};
use crate::services::app_services::{AppServices, Artifact, Delivered, Destination, run_blocking};

/// The compress screen.
pub struct CompressSession {
    services: AppServices,
    in_flight: InFlight,
}

impl CompressSession {
    pub fn new(services: AppServices) -> Self {
        Self {
            services,
            in_flight: InFlight::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Load `input`, optimise it and deliver `optimized-<name>`.
    pub async fn compress(&self, input: &InputSource, destination: &Destination) -> Result<(Delivered, CompressReport)> {
        let _ticket = self.in_flight.try_begin("compress")?;
        let file = load_input(&self.services, input).await?;
        self.optimize_and_deliver(file, destination).await
    }

    /// Same as [`compress`](Self::compress) for a file already in memory.
    pub async fn compress_loaded(
        &self,
        file: LoadedFile,
        destination: &Destination,
    ) -> Result<(Delivered, CompressReport)> {
        let _ticket = self.in_flight.try_begin("compress")?;
        self.optimize_and_deliver(file, destination).await
    }

    #[instrument(skip_all, fields(name = %file.name, bytes_len = file.bytes.len()))]
    async fn optimize_and_deliver(
        &self,
        file: LoadedFile,
        destination: &Destination,
    ) -> Result<(Delivered, CompressReport)> {
        let bytes = file.bytes;
        let (optimized, report) = run_blocking(move || optimize(&bytes)).await?;
        let name = self.services.config().names.optimized(&file.name);

        let delivered = self
            .services
            .deliver(Artifact::new(name, PDF_MIME, optimized), destination)
            .await?;
        info!(reduction_percent = report.reduction_percent, "compression complete");
        Ok((delivered, report))
    }
}
