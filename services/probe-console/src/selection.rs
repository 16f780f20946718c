//! Selection Tracker: the set of monitors the operator has picked
//!
//! Keyed on `(kind, name)` so a selection outlives directory reloads. The
//! tracker never looks at monitor data beyond the keys it is given.

use std::collections::BTreeSet;

use crate::model::{MonitorKind, SelectionKey};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: BTreeSet<SelectionKey>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `key`; returns whether it is now selected
    pub fn toggle(&mut self, key: SelectionKey) -> bool {
        if self.selected.remove(&key) {
            false
        } else {
            self.selected.insert(key);
            true
        }
    }

    /// Add every key; returns how many were not already selected
    pub fn select_all(&mut self, keys: impl IntoIterator<Item = SelectionKey>) -> usize {
        keys.into_iter()
            .filter(|key| self.selected.insert(key.clone()))
            .count()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, key: &SelectionKey) -> bool {
        self.selected.contains(key)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectionKey> {
        self.selected.iter()
    }

    /// Names of the selected monitors of one kind
    pub fn names_of(&self, kind: MonitorKind) -> impl Iterator<Item = &str> {
        self.selected
            .iter()
            .filter(move |key| key.kind == kind)
            .map(|key| key.name.as_str())
    }
}
