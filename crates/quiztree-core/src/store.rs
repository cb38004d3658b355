//! The question store: owner of the canonical forest.
//!
//! All mutations are total. Unknown ids and out-of-range indices are ignored
//! and reported through the return value; nothing here validates content.

use std::collections::HashMap;

use tracing::debug;

use crate::attachment::attachment_markdown;
use crate::error::{HierarchyError, ImportError};
use crate::hierarchy::{flatten, organize, QuestionForest};
use crate::model::{generate_id, Answer, MatchPair, QuestionNode, QuestionRecord, QuestionType};
use crate::reorder::{drop_indices, move_in_group, renumber, renumber_all};
use crate::serializer::{export_records, export_to_json, import_from_json};

/// A single-field edit of a question.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionUpdate {
    Question(String),
    /// Changes the type, converting the answer.
    Type(QuestionType),
    Points(f64),
    Options(Vec<String>),
    /// Replaces the answer; the question takes the answer's type.
    Answer(Answer),
    Language(Option<String>),
    MatchPairs(Vec<MatchPair>),
    ReorderItems(Vec<String>),
    BlankCount(Option<u32>),
}

impl QuestionUpdate {
    fn apply(self, node: &mut QuestionNode) {
        match self {
            QuestionUpdate::Question(text) => node.question = text,
            QuestionUpdate::Type(kind) => {
                let previous = std::mem::replace(&mut node.answer, Answer::FileUpload);
                node.answer = previous.converted_to(kind);
            }
            QuestionUpdate::Points(points) => node.points = points,
            QuestionUpdate::Options(options) => node.options = options,
            QuestionUpdate::Answer(answer) => node.answer = answer,
            QuestionUpdate::Language(language) => node.language = language,
            QuestionUpdate::MatchPairs(pairs) => node.match_pairs = pairs,
            QuestionUpdate::ReorderItems(items) => node.reorder_items = items,
            QuestionUpdate::BlankCount(count) => node.blank_count = count,
        }
    }
}

/// In-memory editor state for one test's questions.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    forest: QuestionForest,
}

impl QuestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing forest, renumbering every sibling group.
    pub fn from_forest(mut forest: QuestionForest) -> Self {
        renumber_all(&mut forest);
        Self { forest }
    }

    /// Rebuild the tree from persisted records.
    pub fn from_records(records: Vec<QuestionRecord>) -> Result<Self, HierarchyError> {
        let nodes = records.into_iter().map(QuestionRecord::into_node).collect();
        Ok(Self::from_forest(organize(nodes)?))
    }

    pub fn forest(&self) -> &QuestionForest {
        &self.forest
    }

    pub fn get(&self, id: &str) -> Option<&QuestionNode> {
        self.forest.get(id)
    }

    pub fn len(&self) -> usize {
        self.forest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    /// Add a blank question at the end of the root list, or of `parent`'s
    /// sub-questions. Returns the new id, or `None` if `parent` is unknown.
    pub fn add_question(&mut self, parent: Option<&str>) -> Option<String> {
        if let Some(p) = parent {
            if !self.forest.contains(p) {
                debug!(parent = p, "add ignored, parent not found");
                return None;
            }
        }
        let mut node = QuestionNode::new(generate_id());
        node.parent_id = parent.map(str::to_string);
        node.order = self.forest.siblings(parent).len();
        let id = node.id.clone();
        if !self.forest.insert(node, None) {
            return None;
        }
        debug!(question = %id, ?parent, "added question");
        Some(id)
    }

    /// Remove a question and its whole subtree. Returns `false` if not found.
    pub fn remove_question(&mut self, id: &str) -> bool {
        let Some(parent) = self.forest.get(id).map(|n| n.parent_id.clone()) else {
            return false;
        };
        let removed = self.forest.remove_subtree(id);
        renumber(&mut self.forest, parent.as_deref());
        debug!(question = id, removed = removed.len(), "removed question subtree");
        true
    }

    /// Apply a single-field edit. Returns `false` if not found.
    pub fn update_question(&mut self, id: &str, update: QuestionUpdate) -> bool {
        match self.forest.get_mut(id) {
            Some(node) => {
                update.apply(node);
                true
            }
            None => false,
        }
    }

    /// Copy a question and its subtree with fresh ids, placing the copy
    /// right after the original. Returns the copy's id.
    pub fn duplicate_question(&mut self, id: &str) -> Option<String> {
        let source = self.forest.get(id)?;
        let parent = source.parent_id.clone();
        let position = self
            .forest
            .siblings(parent.as_deref())
            .iter()
            .position(|sibling| sibling == id)?;

        let subtree = self.forest.subtree_ids(id);
        let fresh: HashMap<&str, String> = subtree
            .iter()
            .map(|old| (old.as_str(), generate_id()))
            .collect();

        let copies: Vec<QuestionNode> = subtree
            .iter()
            .filter_map(|old| self.forest.get(old))
            .map(|original| {
                let mut copy = original.clone();
                copy.id = fresh[original.id.as_str()].clone();
                copy.parent_id = if original.id == id {
                    parent.clone()
                } else {
                    original
                        .parent_id
                        .as_deref()
                        .and_then(|p| fresh.get(p).cloned())
                };
                copy
            })
            .collect();

        let copy_id = fresh[id].clone();
        let mut copies = copies.into_iter();
        let head = copies.next()?;
        self.forest.insert(head, Some(position + 1));
        for copy in copies {
            self.forest.insert(copy, None);
        }
        renumber(&mut self.forest, parent.as_deref());
        debug!(question = id, copy = %copy_id, "duplicated question subtree");
        Some(copy_id)
    }

    /// Move a root-level question by index. Out-of-range moves are ignored.
    pub fn move_question(&mut self, from: usize, to: usize) -> bool {
        move_in_group(&mut self.forest, None, from, to)
    }

    /// Move a sub-question within its parent by index.
    pub fn move_sub_question(&mut self, parent: &str, from: usize, to: usize) -> bool {
        move_in_group(&mut self.forest, Some(parent), from, to)
    }

    /// Drop `active` onto the position of `over`. Both must be siblings.
    pub fn drag_question(&mut self, active: &str, over: &str) -> bool {
        let Some(parent) = self.forest.get(active).map(|n| n.parent_id.clone()) else {
            return false;
        };
        let Some((from, to)) = drop_indices(self.forest.siblings(parent.as_deref()), active, over)
        else {
            return false;
        };
        move_in_group(&mut self.forest, parent.as_deref(), from, to)
    }

    /// Replace the whole tree.
    pub fn replace_all(&mut self, forest: QuestionForest) {
        *self = Self::from_forest(forest);
    }

    /// Import an exchange document, replacing the tree only on success.
    pub fn import_json(&mut self, text: &str) -> Result<(), ImportError> {
        let forest = import_from_json(text)?;
        self.replace_all(forest);
        Ok(())
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        export_to_json(&self.forest)
    }

    /// Pre-order flat list, as handed to persistence.
    pub fn flatten(&self) -> Vec<QuestionNode> {
        flatten(&self.forest)
    }

    pub fn records(&self) -> Vec<QuestionRecord> {
        export_records(&self.forest)
    }

    /// Append an empty option to a question.
    pub fn add_option(&mut self, id: &str) -> bool {
        self.edit(id, |node| {
            node.options.push(String::new());
            true
        })
    }

    pub fn update_option(&mut self, id: &str, index: usize, text: impl Into<String>) -> bool {
        let text = text.into();
        self.edit(id, |node| match node.options.get_mut(index) {
            Some(option) => {
                *option = text;
                true
            }
            None => false,
        })
    }

    pub fn remove_option(&mut self, id: &str, index: usize) -> bool {
        self.edit(id, |node| {
            if index < node.options.len() {
                node.options.remove(index);
                true
            } else {
                false
            }
        })
    }

    /// Append a Markdown link to an uploaded file on a new line of the
    /// question text.
    pub fn append_attachment(&mut self, id: &str, file_name: &str, url: &str) -> bool {
        let link = attachment_markdown(file_name, url);
        self.edit(id, |node| {
            if node.question.is_empty() {
                node.question = link;
            } else {
                node.question = format!("{}\n{}", node.question, link);
            }
            true
        })
    }

    fn edit(&mut self, id: &str, f: impl FnOnce(&mut QuestionNode) -> bool) -> bool {
        self.forest.get_mut(id).is_some_and(f)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::reorder::is_consistent;

    fn store_with_roots(n: usize) -> (QuestionStore, Vec<String>) {
        let mut store = QuestionStore::new();
        let ids = (0..n).filter_map(|_| store.add_question(None)).collect();
        (store, ids)
    }

    #[test]
    fn add_question_appends_roots_with_order() {
        let (store, ids) = store_with_roots(3);
        assert_eq!(store.forest().roots(), ids.as_slice());
        assert_eq!(store.get(&ids[2]).unwrap().order, 2);
        assert_eq!(store.get(&ids[0]).unwrap().options.len(), 4);
    }

    #[test]
    fn add_sub_question_then_flatten() {
        let mut store = QuestionStore::new();
        let parent = store.add_question(None).unwrap();
        let child = store.add_question(Some(&parent)).unwrap();
        let flat = store.flatten();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].id, parent);
        assert_eq!(flat[1].id, child);
        assert_eq!(flat[1].parent_id.as_deref(), Some(parent.as_str()));
    }

    #[test]
    fn add_under_unknown_parent_is_ignored() {
        let mut store = QuestionStore::new();
        assert_eq!(store.add_question(Some("missing")), None);
        assert!(store.is_empty());
    }

    #[test]
    fn remove_cascades_and_renumbers() {
        let (mut store, ids) = store_with_roots(3);
        let child = store.add_question(Some(&ids[0])).unwrap();
        let grandchild = store.add_question(Some(&child)).unwrap();

        assert!(store.remove_question(&ids[0]));
        assert!(store.get(&child).is_none());
        assert!(store.get(&grandchild).is_none());
        assert!(store
            .flatten()
            .iter()
            .all(|n| n.parent_id.as_deref() != Some(ids[0].as_str())));
        assert_eq!(store.get(&ids[1]).unwrap().order, 0);
        assert!(is_consistent(store.forest()));
        assert!(!store.remove_question("missing"));
    }

    #[test]
    fn update_question_fields() {
        let (mut store, ids) = store_with_roots(1);
        let id = &ids[0];
        assert!(store.update_question(id, QuestionUpdate::Question("Capital of France?".into())));
        assert!(store.update_question(id, QuestionUpdate::Type(QuestionType::ShortAnswer)));
        assert!(store.update_question(id, QuestionUpdate::Answer(Answer::ShortAnswer("Paris".into()))));
        assert!(store.update_question(id, QuestionUpdate::Type(QuestionType::Essay)));
        assert!(store.update_question(id, QuestionUpdate::Points(-3.0)));

        let node = store.get(id).unwrap();
        assert_eq!(node.question, "Capital of France?");
        assert_eq!(node.answer, Answer::Essay("Paris".into()));
        assert_eq!(node.points, -3.0);
        assert!(!store.update_question("missing", QuestionUpdate::Points(1.0)));
    }

    #[test]
    fn duplicate_copies_subtree_with_fresh_ids() {
        let (mut store, ids) = store_with_roots(2);
        let child = store.add_question(Some(&ids[0])).unwrap();
        store.add_question(Some(&child)).unwrap();
        store.update_question(&child, QuestionUpdate::Question("child".into()));

        let before: HashSet<String> = store.forest().ids().cloned().collect();
        let copy = store.duplicate_question(&ids[0]).unwrap();

        assert_eq!(store.len(), 7);
        assert_eq!(store.forest().roots()[1], copy);
        assert_eq!(store.get(&ids[1]).unwrap().order, 2);
        let copied: Vec<String> = store.forest().subtree_ids(&copy);
        assert_eq!(copied.len(), 3);
        assert!(copied.iter().all(|id| !before.contains(id)));
        assert_eq!(
            store.get(&copied[1]).unwrap().parent_id.as_deref(),
            Some(copy.as_str())
        );
        assert_eq!(store.get(&copied[1]).unwrap().question, "child");

        store.update_question(&copied[1], QuestionUpdate::Question("changed".into()));
        assert_eq!(store.get(&child).unwrap().question, "child");
        assert!(is_consistent(store.forest()));
    }

    #[test]
    fn duplicate_sub_question_stays_under_parent() {
        let (mut store, ids) = store_with_roots(1);
        let a = store.add_question(Some(&ids[0])).unwrap();
        let b = store.add_question(Some(&ids[0])).unwrap();
        let copy = store.duplicate_question(&a).unwrap();
        assert_eq!(store.forest().children(&ids[0]), [a, copy, b]);
        assert!(is_consistent(store.forest()));
    }

    #[test]
    fn move_question_reorders_roots_only() {
        let (mut store, ids) = store_with_roots(3);
        assert!(store.move_question(0, 2));
        assert_eq!(store.forest().roots(), [ids[1].clone(), ids[2].clone(), ids[0].clone()]);
        assert!(!store.move_question(0, 3));
        assert!(is_consistent(store.forest()));
    }

    #[test]
    fn drag_resolves_to_index_move() {
        let (mut store, ids) = store_with_roots(3);
        assert!(store.drag_question(&ids[2], &ids[0]));
        assert_eq!(store.forest().roots(), [ids[2].clone(), ids[0].clone(), ids[1].clone()]);

        let child = store.add_question(Some(&ids[0])).unwrap();
        assert!(!store.drag_question(&child, &ids[1]));
    }

    #[test]
    fn sub_question_move() {
        let (mut store, ids) = store_with_roots(1);
        let a = store.add_question(Some(&ids[0])).unwrap();
        let b = store.add_question(Some(&ids[0])).unwrap();
        assert!(store.move_sub_question(&ids[0], 1, 0));
        assert_eq!(store.forest().children(&ids[0]), [b, a]);
    }

    #[test]
    fn order_invariant_after_mixed_operations() {
        let (mut store, ids) = store_with_roots(4);
        let child = store.add_question(Some(&ids[1])).unwrap();
        store.add_question(Some(&ids[1])).unwrap();
        store.move_question(3, 0);
        store.remove_question(&ids[2]);
        store.remove_question(&child);
        store.add_question(None);
        store.move_question(1, 3);
        assert!(is_consistent(store.forest()));
    }

    #[test]
    fn failed_import_leaves_tree_untouched() {
        let (mut store, _) = store_with_roots(2);
        let before = store.flatten();
        let bad = r#"{"questions":[
            {"question":"1","type":"ESSAY","points":1},
            {"question":"2","type":"ESSAY","points":1},
            {"question":"3","type":"POEM","points":1}
        ]}"#;
        let err = store.import_json(bad).unwrap_err();
        assert_eq!(err.position(), Some(3));
        assert_eq!(store.flatten(), before);
    }

    #[test]
    fn successful_import_replaces_tree() {
        let (mut store, _) = store_with_roots(2);
        store
            .import_json(r#"{"questions":[{"question":"Only","type":"ESSAY","points":3}]}"#)
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.flatten()[0].question, "Only");
    }

    #[test]
    fn option_editing() {
        let (mut store, ids) = store_with_roots(1);
        let id = &ids[0];
        assert!(store.update_option(id, 0, "Red"));
        assert!(store.add_option(id));
        assert!(store.remove_option(id, 1));
        assert!(!store.remove_option(id, 10));
        assert!(!store.update_option(id, 10, "x"));
        assert_eq!(store.get(id).unwrap().options, ["Red", "", "", ""]);
    }

    #[test]
    fn attachment_is_appended_as_markdown() {
        let (mut store, ids) = store_with_roots(1);
        let id = &ids[0];
        store.append_attachment(id, "diagram.png", "https://cdn/x.png");
        store.update_question(id, QuestionUpdate::Question("See:".into()));
        store.append_attachment(id, "notes.pdf", "https://cdn/n.pdf");
        assert_eq!(
            store.get(id).unwrap().question,
            "See:\n[notes.pdf](https://cdn/n.pdf)"
        );
    }

    #[test]
    fn records_round_trip_through_store() {
        let (mut store, ids) = store_with_roots(2);
        store.add_question(Some(&ids[1])).unwrap();
        let rebuilt = QuestionStore::from_records(store.records()).unwrap();
        assert_eq!(rebuilt.flatten(), store.flatten());
    }
}
