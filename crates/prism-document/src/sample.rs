// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic sample documents for tests and benchmarks.
//
// Every page draws a short label such as `p3` so tests can read page order
// back out of a built document without a text extractor.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use prism_core::error::{PrismError, Result};

/// A document whose pages are labelled `{prefix}1` .. `{prefix}{pages}`.
///
/// All pages share one font/resources object, the way real documents do.
pub fn labelled_pdf(prefix: &str, pages: usize) -> Vec<u8> {
    build(prefix, pages, &vec![None; pages], None, 0)
}

/// `pages` pages labelled `p1` .. `pN`.
pub fn sample_pdf(pages: usize) -> Vec<u8> {
    labelled_pdf("p", pages)
}

/// One page per entry with that `/Rotate` on the page itself; 0 leaves the
/// key out.
pub fn rotated_pdf(rotations: &[i64]) -> Vec<u8> {
    let own: Vec<Option<i64>> = rotations.iter().map(|&r| (r != 0).then_some(r)).collect();
    build("p", rotations.len(), &own, None, 0)
}

/// `pages` pages inheriting `/Rotate` from the page-tree root.
pub fn inherited_rotation_pdf(pages: usize, rotation: i64) -> Vec<u8> {
    build("p", pages, &vec![None; pages], Some(rotation), 0)
}

/// Like [`sample_pdf`] but with large, highly compressible content streams.
pub fn bulky_pdf(pages: usize) -> Vec<u8> {
    build("p", pages, &vec![None; pages], None, 400)
}

/// Page labels of a PDF, in page order.
pub fn page_labels(pdf: &[u8]) -> Result<Vec<String>> {
    let document = Document::load_mem(pdf).map_err(|e| PrismError::Parse(e.to_string()))?;
    document
        .get_pages()
        .into_values()
        .map(|page_id| {
            let content = document
                .get_page_content(page_id)
                .map_err(|e| PrismError::Parse(e.to_string()))?;
            Ok(label_of(&content))
        })
        .collect()
}

/// `/Rotate` of every page as stored on the page dictionary (0 when absent).
pub fn page_rotations(pdf: &[u8]) -> Result<Vec<i64>> {
    let document = Document::load_mem(pdf).map_err(|e| PrismError::Parse(e.to_string()))?;
    Ok(document
        .get_pages()
        .into_values()
        .map(|page_id| {
            document
                .get_dictionary(page_id)
                .and_then(|page| page.get(b"Rotate"))
                .and_then(Object::as_i64)
                .unwrap_or(0)
        })
        .collect())
}

/// Count streams that carry no `/Filter`, i.e. are stored uncompressed.
pub fn uncompressed_stream_count(data: &[u8]) -> Result<usize> {
    let document = Document::load_mem(data).map_err(|e| PrismError::Parse(e.to_string()))?;
    Ok(document
        .objects
        .values()
        .filter(|object| matches!(object, Object::Stream(stream) if !stream.dict.has(b"Filter")))
        .count())
}

fn label_of(content: &[u8]) -> String {
    let text = String::from_utf8_lossy(content);
    text.split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(label, _)| label.to_string())
        .unwrap_or_default()
}

fn build(
    prefix: &str,
    pages: usize,
    own_rotation: &[Option<i64>],
    tree_rotation: Option<i64>,
    padding_ops: usize,
) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let kids: Vec<ObjectId> = (0..pages)
        .map(|i| {
            let mut operations: Vec<Operation> = (0..padding_ops)
                .flat_map(|_| [Operation::new("q", vec![]), Operation::new("Q", vec![])])
                .collect();
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("{prefix}{}", i + 1))]),
                Operation::new("ET", vec![]),
            ]);
            let content = Content { operations }.encode().unwrap_or_default();
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            };
            if let Some(rotation) = own_rotation.get(i).copied().flatten() {
                page.set("Rotate", rotation);
            }
            doc.add_object(page)
        })
        .collect();

    let mut tree = dictionary! {
        "Type" => "Pages",
        "Kids" => kids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
        "Count" => pages as i64,
    };
    if let Some(rotation) = tree_rotation {
        tree.set("Rotate", rotation);
    }
    doc.objects.insert(pages_id, Object::Dictionary(tree));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = doc.save_to(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_read_back_in_order() {
        assert_eq!(
            page_labels(&labelled_pdf("x", 3)).expect("labels"),
            vec!["x1", "x2", "x3"]
        );
    }

    #[test]
    fn rotations_read_back() {
        assert_eq!(
            page_rotations(&rotated_pdf(&[0, 90, 180])).expect("rotations"),
            vec![0, 90, 180]
        );
        // Inherited values are not on the page dictionary itself.
        assert_eq!(
            page_rotations(&inherited_rotation_pdf(2, 90)).expect("rotations"),
            vec![0, 0]
        );
    }
}
