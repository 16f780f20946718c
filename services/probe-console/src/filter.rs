//! Filter Engine: pure derivations over the directory snapshot
//!
//! Nothing here mutates state; every function can be re-run on each render.

use std::collections::{BTreeMap, BTreeSet};

use crate::directory::Directory;
use crate::model::{MonitorItem, MonitorKind, SelectionKey};

/// Search term plus the selected `key:value` tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilterState {
    pub search_term: String,
    pub selected_tags: BTreeSet<String>,
}

impl TagFilterState {
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Flip a flattened tag in or out of the selection; returns whether it is
    /// now selected
    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        if self.selected_tags.remove(tag) {
            false
        } else {
            self.selected_tags.insert(tag.to_string());
            true
        }
    }

    /// Reset both the search term and the tag selection
    pub fn clear(&mut self) {
        self.search_term.clear();
        self.selected_tags.clear();
    }

    pub fn is_tag_selected(&self, tag: &str) -> bool {
        self.selected_tags.contains(tag)
    }
}

/// A directory item paired with its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorEntry<'a> {
    pub kind: MonitorKind,
    pub item: &'a MonitorItem,
}

impl MonitorEntry<'_> {
    pub fn key(&self) -> SelectionKey {
        SelectionKey::new(self.kind, self.item.name.clone())
    }
}

impl AsRef<MonitorItem> for MonitorEntry<'_> {
    fn as_ref(&self) -> &MonitorItem {
        self.item
    }
}

impl AsRef<MonitorItem> for MonitorItem {
    fn as_ref(&self) -> &MonitorItem {
        self
    }
}

/// Tag values grouped by key; both levels iterate in sorted order
pub type TagVocabulary = BTreeMap<String, BTreeSet<String>>;

/// Every tag key seen across `items`, with its distinct values
pub fn tag_vocabulary<T: AsRef<MonitorItem>>(items: impl IntoIterator<Item = T>) -> TagVocabulary {
    let mut vocabulary = TagVocabulary::new();
    for item in items {
        for (key, value) in &item.as_ref().tags {
            vocabulary
                .entry(key.clone())
                .or_default()
                .insert(value.clone());
        }
    }
    vocabulary
}

/// Case-insensitive substring match on the name. A blank term keeps everything.
pub fn search_by_name<T: AsRef<MonitorItem>>(
    items: impl IntoIterator<Item = T>,
    term: &str,
) -> Vec<T> {
    if term.trim().is_empty() {
        return items.into_iter().collect();
    }
    let term = term.to_lowercase();
    items
        .into_iter()
        .filter(|item| item.as_ref().name.to_lowercase().contains(&term))
        .collect()
}

/// Keep items carrying at least one of the selected tags
///
/// Selected tags are OR-ed, including across different keys. With an empty
/// selection every item passes; otherwise untagged items never pass.
pub fn filter_by_tags<T: AsRef<MonitorItem>>(
    items: impl IntoIterator<Item = T>,
    selected: &BTreeSet<String>,
) -> Vec<T> {
    if selected.is_empty() {
        return items.into_iter().collect();
    }
    items
        .into_iter()
        .filter(|item| {
            item.as_ref()
                .flattened_tags()
                .any(|tag| selected.contains(&tag))
        })
        .collect()
}

/// Monitors the grid shows: name search first, then the tag filter
pub fn visible<'a>(directory: &'a Directory, filter: &TagFilterState) -> Vec<MonitorEntry<'a>> {
    let entries = directory
        .entries()
        .map(|(kind, item)| MonitorEntry { kind, item });
    let searched = search_by_name(entries, &filter.search_term);
    if searched.is_empty() {
        return searched;
    }
    filter_by_tags(searched, &filter.selected_tags)
}

/// Monitors passing the tag filter alone, ignoring the search term
pub fn tag_filtered<'a>(
    directory: &'a Directory,
    selected: &BTreeSet<String>,
) -> Vec<MonitorEntry<'a>> {
    let entries = directory
        .entries()
        .map(|(kind, item)| MonitorEntry { kind, item });
    filter_by_tags(entries, selected)
}
