// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Prism.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PrismError, Result};

/// MIME type of PDF outputs.
pub const PDF_MIME: &str = "application/pdf";
/// MIME type of split-all archives.
pub const ZIP_MIME: &str = "application/zip";
/// Fallback MIME type for anything we don't recognise.
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// Stable identity of a [`PageRef`].
///
/// Generated once when the PageRef is created and never reused. Reordering,
/// rotation and removal are keyed by this id, never by list position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageRefId(pub Uuid);

impl PageRefId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageRefId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageRefId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which loaded source document a [`PageRef`] points into.
///
/// This is the position of the source in the owning session's source list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceKey(pub usize);

impl std::fmt::Display for SourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// A clockwise quarter-turn rotation: 0, 90, 180 or 270 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rotation(u16);

impl Rotation {
    pub const NONE: Rotation = Rotation(0);
    pub const QUARTER: Rotation = Rotation(90);
    pub const HALF: Rotation = Rotation(180);
    pub const THREE_QUARTERS: Rotation = Rotation(270);

    /// Build a rotation from any multiple of 90 degrees, normalising into
    /// `0..360` (so `-90` becomes `270` and `450` becomes `90`).
    pub fn from_degrees(degrees: i64) -> Result<Self> {
        if degrees % 90 != 0 {
            return Err(PrismError::InvalidRotation(degrees));
        }
        Ok(Self(degrees.rem_euclid(360) as u16))
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    /// One further clockwise quarter turn.
    pub fn quarter_turn(self) -> Self {
        Self((self.0 + 90) % 360)
    }

    /// Apply this rotation as a delta on top of an existing `/Rotate` value.
    ///
    /// The existing value comes straight from the document and may be
    /// negative, unnormalised, or (in broken files) not a multiple of 90; it
    /// is only reduced modulo 360.
    pub fn applied_to(self, existing: i64) -> i64 {
        (existing + i64::from(self.0)).rem_euclid(360)
    }
}

impl TryFrom<i64> for Rotation {
    type Error = PrismError;

    fn try_from(degrees: i64) -> Result<Self> {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for i64 {
    fn from(rotation: Rotation) -> Self {
        i64::from(rotation.0)
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// The atomic unit of a page set: one page of one source document plus a
/// rotation delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub id: PageRefId,
    pub source: SourceKey,
    /// Zero-based index into the source document's page sequence.
    pub source_index: usize,
    pub rotation: Rotation,
}

impl PageRef {
    /// A fresh, unrotated reference with a newly generated id.
    pub fn new(source: SourceKey, source_index: usize) -> Self {
        Self {
            id: PageRefId::new(),
            source,
            source_index,
            rotation: Rotation::NONE,
        }
    }

    /// Another reference to the same source page, with its own id and its
    /// own rotation state.
    pub fn duplicate(&self) -> Self {
        Self {
            id: PageRefId::new(),
            ..*self
        }
    }
}

/// Primary key of a record in the workspace store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(text: &str) -> Result<Self> {
        Uuid::parse_str(text)
            .map(Self)
            .map_err(|e| PrismError::Storage(format!("invalid file id {text:?}: {e}")))
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata of a stored workspace file. The content is fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFileMeta {
    pub id: FileId,
    pub name: String,
    pub mime_type: String,
    /// Content length in bytes.
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Infer a MIME type from a file name's extension.
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => PDF_MIME,
        Some("zip") => ZIP_MIME,
        _ => OCTET_STREAM_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_normalises_multiples_of_ninety() {
        assert_eq!(Rotation::from_degrees(-90).expect("rotation"), Rotation::THREE_QUARTERS);
        assert_eq!(Rotation::from_degrees(450).expect("rotation"), Rotation::QUARTER);
        assert_eq!(Rotation::from_degrees(360).expect("rotation"), Rotation::NONE);
    }

    #[test]
    fn rotation_rejects_odd_angles() {
        assert!(matches!(
            Rotation::from_degrees(45),
            Err(PrismError::InvalidRotation(45))
        ));
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        let start = Rotation::HALF;
        let end = start.quarter_turn().quarter_turn().quarter_turn().quarter_turn();
        assert_eq!(start, end);
    }

    #[test]
    fn rotation_is_additive_on_existing_value() {
        assert_eq!(Rotation::QUARTER.applied_to(270), 0);
        assert_eq!(Rotation::HALF.applied_to(-90), 90);
        assert_eq!(Rotation::NONE.applied_to(450), 90);
    }

    #[test]
    fn duplicate_gets_fresh_identity() {
        let original = PageRef::new(SourceKey(0), 3);
        let copy = original.duplicate();
        assert_ne!(original.id, copy.id);
        assert_eq!(copy.source_index, 3);
    }

    #[test]
    fn mime_inferred_from_extension() {
        assert_eq!(mime_for_name("merged.PDF"), PDF_MIME);
        assert_eq!(mime_for_name("split-pages.zip"), ZIP_MIME);
        assert_eq!(mime_for_name("notes"), OCTET_STREAM_MIME);
    }
}
