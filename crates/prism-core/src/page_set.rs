// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reorder/select engine — pure state transitions over ordered lists of
// identified items.
//
// Every mutation is keyed by stable identity, never by position, so a list
// rendered in one order and edited in another can never drift apart from the
// data it describes. Positions are only read back when output is built.

use std::collections::BTreeSet;

use tracing::debug;

use crate::types::{PageRef, PageRefId, Rotation, SourceKey};

/// Items that carry a stable identity.
pub trait Keyed {
    type Key: Copy + Eq + std::fmt::Debug;

    fn key(&self) -> Self::Key;
}

impl Keyed for PageRef {
    type Key = PageRefId;

    fn key(&self) -> PageRefId {
        self.id
    }
}

/// An ordered list whose elements are addressed by key.
///
/// Only [`OrderedList::remove`] and [`OrderedList::clear`] change the number
/// of elements; moves are permutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedList<T> {
    items: Vec<T>,
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed> OrderedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) {
        self.items.extend(items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// Current position of `key`, if present.
    pub fn position(&self, key: T::Key) -> Option<usize> {
        self.items.iter().position(|item| item.key() == key)
    }

    pub fn get(&self, key: T::Key) -> Option<&T> {
        self.items.iter().find(|item| item.key() == key)
    }

    pub fn get_mut(&mut self, key: T::Key) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.key() == key)
    }

    /// Take the item out of its current position and reinsert it at
    /// `to_index`, shifting the others. Indices past the end clamp to the
    /// last position.
    ///
    /// Returns `false` without touching the list when `key` is unknown or the
    /// item is already at `to_index`.
    pub fn move_to(&mut self, key: T::Key, to_index: usize) -> bool {
        let Some(from) = self.position(key) else {
            debug!(?key, "move ignored: unknown key");
            return false;
        };
        let to = to_index.min(self.items.len() - 1);
        if from == to {
            return false;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        true
    }

    /// Drag-and-drop style move: `active` takes the position currently held
    /// by `over`.
    pub fn move_onto(&mut self, active: T::Key, over: T::Key) -> bool {
        match self.position(over) {
            Some(target) if active != over => self.move_to(active, target),
            _ => false,
        }
    }

    /// Delete the item with `key`, returning it. Unknown keys are ignored.
    pub fn remove(&mut self, key: T::Key) -> Option<T> {
        let index = self.position(key)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a, T> IntoIterator for &'a OrderedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// The ordered page list that defines one output document.
pub type PageSet = OrderedList<PageRef>;

impl OrderedList<PageRef> {
    /// One unrotated PageRef per page of a source, in natural order.
    pub fn from_source(source: SourceKey, page_count: usize) -> Self {
        Self::from_vec(
            (0..page_count)
                .map(|index| PageRef::new(source, index))
                .collect(),
        )
    }

    /// Append every page of another source, in natural order.
    pub fn append_source(&mut self, source: SourceKey, page_count: usize) {
        self.extend((0..page_count).map(|index| PageRef::new(source, index)));
    }

    /// Rotate one page a further 90 degrees clockwise. Returns the new
    /// rotation, or `None` for an unknown id.
    pub fn toggle_rotate(&mut self, id: PageRefId) -> Option<Rotation> {
        let page = self.get_mut(id)?;
        page.rotation = page.rotation.quarter_turn();
        Some(page.rotation)
    }

    /// Insert a copy of `id` right after it. The copy has its own identity
    /// and rotates independently of the original.
    pub fn duplicate(&mut self, id: PageRefId) -> Option<PageRefId> {
        let index = self.position(id)?;
        let copy = self.items[index].duplicate();
        let copy_id = copy.id;
        self.items.insert(index + 1, copy);
        Some(copy_id)
    }
}

/// Selected page indices for extraction.
///
/// Indices refer to the current thumbnail order of one source. The set is
/// kept sorted, so extraction always follows the document's natural page
/// order rather than the order pages were clicked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    page_count: usize,
    selected: BTreeSet<usize>,
}

impl PageSelection {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            selected: BTreeSet::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Flip the selection state of `index`. Returns whether it is selected
    /// afterwards; out-of-range indices are never selected.
    pub fn toggle(&mut self, index: usize) -> bool {
        if index >= self.page_count {
            debug!(index, page_count = self.page_count, "selection toggle out of range");
            return false;
        }
        if !self.selected.remove(&index) {
            self.selected.insert(index);
            return true;
        }
        false
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Selected indices in ascending order.
    pub fn normalized(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    /// A page set of the selected pages of `source`, ascending.
    pub fn to_page_set(&self, source: SourceKey) -> PageSet {
        PageSet::from_vec(
            self.selected
                .iter()
                .map(|&index| PageRef::new(source, index))
                .collect(),
        )
    }
}
