//! Ordered, mutable list of candidate items plus the UI selection.

use crate::models::CandidateItem;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<CandidateItem>,
    selected: Option<usize>,
}

impl Catalog {
    pub fn new(items: Vec<CandidateItem>) -> Self {
        Self {
            items,
            selected: None,
        }
    }

    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new(paths.into_iter().map(CandidateItem::new).collect())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CandidateItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&CandidateItem> {
        self.items.get(index)
    }

    pub fn eligible_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_eligible()).count()
    }

    /// First eligible index at or after `from`.
    pub fn next_eligible(&self, from: usize) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, item)| item.is_eligible())
            .map(|(idx, _)| idx)
    }

    /// Removes the item at `index`, shifting later items down by one.
    /// The selection follows the item it pointed at, or is cleared if that
    /// item is the one removed.
    pub fn remove(&mut self, index: usize) -> Option<CandidateItem> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        self.selected = match self.selected {
            Some(sel) if sel == index => None,
            Some(sel) if sel > index => Some(sel - 1),
            other => other,
        };
        Some(removed)
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&CandidateItem> {
        self.selected.and_then(|idx| self.items.get(idx))
    }

    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| compare_paths(&a.path, &b.path));
        self.selected = None;
    }
}

/// Digits first, then letters with lowercase ahead of uppercase
/// (a, A, b, B, ...), then every other byte by value.
fn char_rank(c: u8) -> u32 {
    match c {
        b'0'..=b'9' => u32::from(c - b'0'),
        b'a'..=b'z' => 10 + u32::from(c - b'a') * 2,
        b'A'..=b'Z' => 10 + u32::from(c - b'A') * 2 + 1,
        _ => 1000 + u32::from(c),
    }
}

/// Catalog display order. A proper prefix sorts before the longer path.
pub fn compare_paths(a: &Path, b: &Path) -> Ordering {
    let a = a.to_string_lossy();
    let b = b.to_string_lossy();
    a.bytes()
        .map(char_rank)
        .cmp(b.bytes().map(char_rank))
}
