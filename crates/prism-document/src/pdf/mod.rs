// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — loading sources, copying pages, building page sets, splitting.

pub mod builder;
pub mod copy;
pub mod source;
pub mod split;

pub use builder::{PageResolver, PageSetBuilder};
pub use copy::{OutputDocument, PageHandle};
pub use source::SourceDocument;
pub use split::{SplitPage, SplitPages, split_all_to_archive, split_pages};
