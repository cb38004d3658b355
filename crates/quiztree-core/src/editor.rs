//! A question store paired with its view state.

use crate::error::ImportError;
use crate::store::QuestionStore;
use crate::view::ViewState;

/// Editing session for one test.
///
/// Keeps the view state in step with structural changes: adding a
/// sub-question expands its parent, removals prune state for the whole
/// subtree, and an import starts from a clean view.
#[derive(Debug, Clone, Default)]
pub struct QuestionEditor {
    store: QuestionStore,
    view: ViewState,
}

impl QuestionEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_store(store: QuestionStore) -> Self {
        Self {
            store,
            view: ViewState::new(),
        }
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut QuestionStore {
        &mut self.store
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub fn into_store(self) -> QuestionStore {
        self.store
    }

    pub fn add_question(&mut self, parent: Option<&str>) -> Option<String> {
        let id = self.store.add_question(parent)?;
        if let Some(p) = parent {
            self.view.expand(p);
        }
        Some(id)
    }

    pub fn remove_question(&mut self, id: &str) -> bool {
        let doomed = self.store.forest().subtree_ids(id);
        if !self.store.remove_question(id) {
            return false;
        }
        self.view.forget(&doomed);
        true
    }

    pub fn import_json(&mut self, text: &str) -> Result<(), ImportError> {
        self.store.import_json(text)?;
        self.view.clear();
        Ok(())
    }
}
