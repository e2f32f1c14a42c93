// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Source documents — parsed input files that pages are copied out of.

use lopdf::{Document, Object, ObjectId};
use prism_core::error::{PrismError, Result};
use tracing::{debug, info, instrument};

/// Page-tree attributes a page may inherit from its ancestors.
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against malformed page trees whose `/Parent` chain loops.
const MAX_TREE_DEPTH: usize = 64;

/// One parsed input file.
///
/// Owned by the operation that loaded it and dropped once that operation has
/// produced its output bytes. Sources are never mutated.
pub struct SourceDocument {
    /// The underlying lopdf document.
    document: Document,
    /// Display name (usually the file name), used in logs and errors.
    name: String,
    /// Page object ids in page order; index 0 is the first page.
    page_ids: Vec<ObjectId>,
}

impl SourceDocument {
    // -- Construction ---------------------------------------------------------

    /// Parse a PDF already held in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(name: impl Into<String>, data: &[u8]) -> Result<Self> {
        let name = name.into();
        let document = Document::load_mem(data)
            .map_err(|err| PrismError::Parse(format!("{name}: {err}")))?;

        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(PrismError::Parse(format!("{name}: document has no pages")));
        }

        info!(name = %name, pages = page_ids.len(), "source document loaded");

        Ok(Self {
            document,
            name,
            page_ids,
        })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Object id of the page at zero-based `index`.
    pub fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.page_ids
            .get(index)
            .copied()
            .ok_or(PrismError::PageIndex {
                index,
                page_count: self.page_ids.len(),
            })
    }

    /// Effective `/Rotate` of a page in degrees, including a value inherited
    /// from the page tree. Pages without one report 0.
    pub fn rotation(&self, index: usize) -> Result<i64> {
        let page_id = self.page_id(index)?;
        let rotation = inherited_attribute(&self.document, page_id, b"Rotate")
            .and_then(|value| integer_value(&self.document, &value))
            .unwrap_or(0);

        debug!(index, rotation, "page rotation read");
        Ok(rotation)
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("name", &self.name)
            .field("pages", &self.page_ids.len())
            .finish()
    }
}

/// Look `key` up on a page dictionary, walking `/Parent` links until some
/// ancestor defines it.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }

    None
}

/// Read a numeric object as an integer, following one level of indirection.
pub(crate) fn integer_value(doc: &Document, value: &Object) -> Option<i64> {
    match value {
        Object::Integer(v) => Some(*v),
        Object::Real(v) => Some(*v as i64),
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Integer(v) => Some(*v),
            Object::Real(v) => Some(*v as i64),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    #[test]
    fn loads_page_count() {
        let source = SourceDocument::from_bytes("five.pdf", &sample::sample_pdf(5)).expect("load");
        assert_eq!(source.page_count(), 5);
        assert_eq!(source.name(), "five.pdf");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let result = SourceDocument::from_bytes("junk.pdf", b"definitely not a pdf");
        assert!(matches!(result, Err(PrismError::Parse(_))));
    }

    #[test]
    fn page_index_is_validated() {
        let source = SourceDocument::from_bytes("two.pdf", &sample::sample_pdf(2)).expect("load");
        assert!(matches!(
            source.page_id(2),
            Err(PrismError::PageIndex { index: 2, page_count: 2 })
        ));
    }

    #[test]
    fn reads_own_and_inherited_rotation() {
        let own = SourceDocument::from_bytes("own.pdf", &sample::rotated_pdf(&[0, 90, 270]))
            .expect("load");
        assert_eq!(own.rotation(0).expect("rotation"), 0);
        assert_eq!(own.rotation(1).expect("rotation"), 90);
        assert_eq!(own.rotation(2).expect("rotation"), 270);

        let inherited =
            SourceDocument::from_bytes("tree.pdf", &sample::inherited_rotation_pdf(2, 180))
                .expect("load");
        assert_eq!(inherited.rotation(1).expect("rotation"), 180);
    }
}
