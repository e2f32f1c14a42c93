// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page copying — the narrow document-library surface the builder works
// through: create an empty document, copy pages out of a source, append them,
// read and set rotation, serialise.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use prism_core::error::{PrismError, Result};
use tracing::{debug, instrument, warn};

use super::source::{INHERITABLE_KEYS, SourceDocument, inherited_attribute, integer_value};

/// A page that has been copied into an [`OutputDocument`] but not
/// necessarily appended to its page tree yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle(ObjectId);

/// A document under construction.
pub struct OutputDocument {
    document: Document,
    /// Id reserved for the `/Pages` root, written out on save.
    pages_id: ObjectId,
    /// Appended pages in output order.
    kids: Vec<ObjectId>,
}

impl OutputDocument {
    /// A document with a catalog and an empty page tree.
    pub fn create_empty(version: &str) -> Self {
        let mut document = Document::with_version(version);
        let pages_id = document.new_object_id();
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        document.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Copy the pages at `indices` (zero-based) out of `source`.
    ///
    /// Objects the pages share, such as fonts and images, are copied once per
    /// call no matter how many of the pages use them. Every requested index
    /// gets its own page object, so a page listed twice yields two handles
    /// whose rotation can differ. The returned handles follow `indices`.
    #[instrument(skip_all, fields(source = source.name(), pages = indices.len()))]
    pub fn copy_pages(&mut self, source: &SourceDocument, indices: &[usize]) -> Result<Vec<PageHandle>> {
        let mut copied: HashMap<ObjectId, ObjectId> = HashMap::new();
        let mut handles = Vec::with_capacity(indices.len());

        for &index in indices {
            let page_id = source.page_id(index)?;
            let handle = self.copy_page(source.document(), page_id, &mut copied)?;
            handles.push(handle);
        }

        debug!(objects = copied.len(), "pages copied");
        Ok(handles)
    }

    /// Append a copied page to the end of the page tree.
    pub fn add_page(&mut self, handle: PageHandle) {
        self.kids.push(handle.0);
    }

    /// Number of appended pages.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Current `/Rotate` of a copied page (0 when absent).
    pub fn rotation(&self, handle: PageHandle) -> i64 {
        self.document
            .get_dictionary(handle.0)
            .ok()
            .and_then(|dict| dict.get(b"Rotate").ok())
            .and_then(|value| integer_value(&self.document, value))
            .unwrap_or(0)
    }

    /// Overwrite `/Rotate` on a copied page.
    pub fn set_rotation(&mut self, handle: PageHandle, degrees: i64) -> Result<()> {
        let dict = self
            .document
            .get_object_mut(handle.0)
            .and_then(Object::as_dict_mut)
            .map_err(|err| PrismError::Serialize(format!("copied page {:?} missing: {}", handle.0, err)))?;
        dict.set("Rotate", Object::Integer(degrees));
        Ok(())
    }

    /// Write the page tree and serialise the document.
    ///
    /// With `compress`, unreferenced objects are pruned and streams are
    /// flate-compressed before writing.
    #[instrument(skip_all, fields(pages = self.kids.len(), compress))]
    pub fn save(mut self, compress: bool) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        if compress {
            self.document.prune_objects();
            self.document.compress();
        }

        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| PrismError::Serialize(format!("failed to serialise document: {err}")))?;

        debug!(output_bytes = output.len(), "document serialised");
        Ok(output)
    }

    // -- Helpers --------------------------------------------------------------

    fn copy_page(
        &mut self,
        source: &Document,
        page_id: ObjectId,
        copied: &mut HashMap<ObjectId, ObjectId>,
    ) -> Result<PageHandle> {
        let page = source.get_dictionary(page_id).map_err(|err| {
            PrismError::Parse(format!("cannot read page object {page_id:?}: {err}"))
        })?;

        // Back-references to this page (e.g. an annotation's /P) resolve to
        // the first copy made in this call.
        let new_id = self.document.new_object_id();
        copied.entry(page_id).or_insert(new_id);

        let mut dict = copy_dictionary(source, &mut self.document, page, copied);

        // Materialise attributes the page used to inherit from its old tree.
        for key in INHERITABLE_KEYS {
            if dict.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page_id, key) {
                let value = copy_object(source, &mut self.document, &value, copied);
                dict.set(key.to_vec(), value);
            }
        }

        dict.set("Parent", Object::Reference(self.pages_id));
        self.document.objects.insert(new_id, Object::Dictionary(dict));

        Ok(PageHandle(new_id))
    }
}

/// Copy a dictionary into `target`, dropping links up into the source page
/// tree. The caller re-parents page dictionaries itself.
fn copy_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Dictionary {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" && points_into_page_tree(source, value) {
            continue;
        }
        new_dict.set(key.clone(), copy_object(source, target, value, copied));
    }
    new_dict
}

/// Deep-copy one object, copying every referenced object exactly once.
fn copy_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Object {
    match object {
        Object::Reference(id) => copy_reference(source, target, *id, copied),
        Object::Dictionary(dict) => Object::Dictionary(copy_dictionary(source, target, dict, copied)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| copy_object(source, target, item, copied))
                .collect(),
        ),
        Object::Stream(stream) => {
            let mut new_stream = stream.clone();
            new_stream.dict = copy_dictionary(source, target, &stream.dict, copied);
            Object::Stream(new_stream)
        }
        other => other.clone(),
    }
}

fn copy_reference(
    source: &Document,
    target: &mut Document,
    id: ObjectId,
    copied: &mut HashMap<ObjectId, ObjectId>,
) -> Object {
    if let Some(new_id) = copied.get(&id) {
        return Object::Reference(*new_id);
    }

    match source.get_object(id) {
        Ok(referenced) => {
            // Reserve the id before recursing so cycles terminate.
            let new_id = target.new_object_id();
            copied.insert(id, new_id);
            let object = copy_object(source, target, referenced, copied);
            target.objects.insert(new_id, object);
            Object::Reference(new_id)
        }
        Err(err) => {
            warn!(?id, %err, "dangling reference in source, using null");
            Object::Null
        }
    }
}

/// Whether `value` references a `/Pages` or `/Page` node of the source tree.
fn points_into_page_tree(source: &Document, value: &Object) -> bool {
    let Ok(id) = value.as_reference() else {
        return false;
    };
    source
        .get_dictionary(id)
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|ty| ty.as_name().ok())
        .is_some_and(|name| name == b"Pages" || name == b"Page")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    fn source(pages: usize) -> SourceDocument {
        SourceDocument::from_bytes("src.pdf", &sample::sample_pdf(pages)).expect("load")
    }

    #[test]
    fn copies_requested_pages_in_order() {
        let src = source(4);
        let mut out = OutputDocument::create_empty("1.7");
        for handle in out.copy_pages(&src, &[3, 0]).expect("copy") {
            out.add_page(handle);
        }
        let bytes = out.save(false).expect("save");

        assert_eq!(sample::page_labels(&bytes).expect("labels"), vec!["p4", "p1"]);
    }

    #[test]
    fn shared_resources_are_copied_once() {
        let src = source(3);
        let mut out = OutputDocument::create_empty("1.7");
        let handles = out.copy_pages(&src, &[0, 1, 2]).expect("copy");
        for handle in &handles {
            out.add_page(*handle);
        }

        let resources: Vec<Object> = handles
            .iter()
            .map(|h| {
                out.document
                    .get_dictionary(h.0)
                    .and_then(|d| d.get(b"Resources"))
                    .expect("resources")
                    .clone()
            })
            .collect();
        assert_eq!(resources[0], resources[1]);
        assert_eq!(resources[1], resources[2]);
    }

    #[test]
    fn duplicate_indices_get_separate_page_objects() {
        let src = source(2);
        let mut out = OutputDocument::create_empty("1.7");
        let handles = out.copy_pages(&src, &[1, 1]).expect("copy");
        assert_ne!(handles[0], handles[1]);

        out.set_rotation(handles[1], 90).expect("rotate");
        assert_eq!(out.rotation(handles[0]), 0);
        assert_eq!(out.rotation(handles[1]), 90);
    }

    #[test]
    fn inherited_rotation_is_materialised() {
        let src = SourceDocument::from_bytes("tree.pdf", &sample::inherited_rotation_pdf(2, 90))
            .expect("load");
        let mut out = OutputDocument::create_empty("1.7");
        let handles = out.copy_pages(&src, &[0]).expect("copy");
        assert_eq!(out.rotation(handles[0]), 90);
    }

    #[test]
    fn out_of_range_index_fails() {
        let src = source(2);
        let mut out = OutputDocument::create_empty("1.7");
        assert!(matches!(
            out.copy_pages(&src, &[5]),
            Err(PrismError::PageIndex { index: 5, page_count: 2 })
        ));
    }
}
