// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Prism — Core types, the page-set engine and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod notice;
pub mod page_set;
pub mod types;

pub use config::{AppConfig, OutputNames};
pub use error::{PrismError, Result};
pub use notice::{Notice, Severity, notice_for};
pub use page_set::{Keyed, OrderedList, PageSelection, PageSet};
pub use types::*;
