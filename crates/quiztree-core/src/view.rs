//! Presentation state kept beside the question store.
//!
//! Which questions are expanded and which tab each shows are UI concerns;
//! they are keyed by question id and never stored on the nodes.

use std::collections::{HashMap, HashSet};

/// Editor tab shown for a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tab {
    #[default]
    Edit,
    Preview,
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    expanded: HashSet<String>,
    tabs: HashMap<String, Tab>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expand(&mut self, id: &str) {
        self.expanded.insert(id.to_string());
    }

    pub fn collapse(&mut self, id: &str) {
        self.expanded.remove(id);
    }

    /// Flip expansion. Returns the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn set_tab(&mut self, id: &str, tab: Tab) {
        self.tabs.insert(id.to_string(), tab);
    }

    pub fn tab(&self, id: &str) -> Tab {
        self.tabs.get(id).copied().unwrap_or_default()
    }

    /// Drop all state for the given ids.
    pub fn forget<'a>(&mut self, ids: impl IntoIterator<Item = &'a String>) {
        for id in ids {
            self.expanded.remove(id);
            self.tabs.remove(id);
        }
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
        self.tabs.clear();
    }
}
