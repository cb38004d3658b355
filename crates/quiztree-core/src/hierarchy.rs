//! Question forest and flat-list conversion.
//!
//! The flat list with `parent_id` back-references is the persistence-facing
//! form. The [`QuestionForest`] is an arena keyed by id whose slots hold
//! ordered child id lists, so mutating a node anywhere in the tree is a map
//! update and every traversal is an explicit stack walk.

use std::collections::{HashMap, HashSet};

use crate::error::HierarchyError;
use crate::model::QuestionNode;

#[derive(Debug, Clone)]
struct Slot {
    node: QuestionNode,
    children: Vec<String>,
}

/// An ordered forest of questions.
#[derive(Debug, Clone, Default)]
pub struct QuestionForest {
    slots: HashMap<String, Slot>,
    roots: Vec<String>,
}

impl QuestionForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of questions at every depth.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&QuestionNode> {
        self.slots.get(id).map(|s| &s.node)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut QuestionNode> {
        self.slots.get_mut(id).map(|s| &mut s.node)
    }

    /// Root-level question ids in sibling order.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Child ids of a question in sibling order. Empty for unknown ids.
    pub fn children(&self, id: &str) -> &[String] {
        self.slots
            .get(id)
            .map(|s| s.children.as_slice())
            .unwrap_or(&[])
    }

    /// The sub-questions of a question.
    pub fn sub_questions(&self, id: &str) -> Vec<&QuestionNode> {
        self.children(id)
            .iter()
            .filter_map(|child| self.get(child))
            .collect()
    }

    /// Ids of a sibling group: the roots for `None`, else the parent's children.
    pub fn siblings(&self, parent: Option<&str>) -> &[String] {
        match parent {
            None => self.roots.as_slice(),
            Some(p) => self.children(p),
        }
    }

    pub(crate) fn siblings_mut(&mut self, parent: Option<&str>) -> Option<&mut Vec<String>> {
        match parent {
            None => Some(&mut self.roots),
            Some(p) => self.slots.get_mut(p).map(|s| &mut s.children),
        }
    }

    /// Attach a node under its `parent_id`, at `position` or at the end.
    ///
    /// Returns `false`, leaving the forest untouched, if the id is taken or
    /// the parent does not exist.
    pub(crate) fn insert(&mut self, node: QuestionNode, position: Option<usize>) -> bool {
        if self.slots.contains_key(&node.id) {
            return false;
        }
        let id = node.id.clone();
        let parent = node.parent_id.clone();
        let Some(group) = self.siblings_mut(parent.as_deref()) else {
            return false;
        };
        let index = position.map_or(group.len(), |p| p.min(group.len()));
        group.insert(index, id.clone());
        self.slots.insert(
            id,
            Slot {
                node,
                children: Vec::new(),
            },
        );
        true
    }

    /// Detach a node and its whole subtree. Returns the removed nodes in pre-order.
    pub(crate) fn remove_subtree(&mut self, id: &str) -> Vec<QuestionNode> {
        let Some(parent) = self.get(id).map(|n| n.parent_id.clone()) else {
            return Vec::new();
        };
        if let Some(group) = self.siblings_mut(parent.as_deref()) {
            group.retain(|sibling| sibling != id);
        }
        self.subtree_ids(id)
            .into_iter()
            .filter_map(|removed| self.slots.remove(&removed).map(|s| s.node))
            .collect()
    }

    /// Ids of a node and all its descendants in pre-order.
    pub fn subtree_ids(&self, id: &str) -> Vec<String> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut ids = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            stack.extend(self.children(&current).iter().rev().cloned());
            ids.push(current);
        }
        ids
    }

    /// Every node in pre-order, paired with its depth (roots are depth 0).
    pub fn depth_first(&self) -> Vec<(usize, &QuestionNode)> {
        let mut out = Vec::with_capacity(self.slots.len());
        let mut stack: Vec<(usize, &str)> =
            self.roots.iter().rev().map(|id| (0, id.as_str())).collect();
        while let Some((depth, id)) = stack.pop() {
            let Some(slot) = self.slots.get(id) else {
                continue;
            };
            out.push((depth, &slot.node));
            stack.extend(slot.children.iter().rev().map(|c| (depth + 1, c.as_str())));
        }
        out
    }

    /// All ids, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.slots.keys()
    }
}

/// Pre-order traversal of the forest, parents before children.
///
/// `parent_id` and `order` are emitted as stored.
pub fn flatten(forest: &QuestionForest) -> Vec<QuestionNode> {
    forest
        .depth_first()
        .into_iter()
        .map(|(_, node)| node.clone())
        .collect()
}

/// Rebuild a forest from a flat list.
///
/// Nodes whose `parent_id` does not resolve are demoted to root with a
/// warning. Every sibling group is sorted by ascending `order`, ties keeping
/// input order. Duplicate ids and cyclic parent chains are rejected.
pub fn organize(nodes: Vec<QuestionNode>) -> Result<QuestionForest, HierarchyError> {
    let mut known = HashSet::with_capacity(nodes.len());
    for node in &nodes {
        if !known.insert(node.id.clone()) {
            return Err(HierarchyError::DuplicateId(node.id.clone()));
        }
    }

    let input_order: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let mut forest = QuestionForest::new();
    let mut links: Vec<(Option<String>, String)> = Vec::with_capacity(nodes.len());

    for mut node in nodes {
        if let Some(parent) = node.parent_id.as_deref() {
            if !known.contains(parent) {
                tracing::warn!(
                    question = %node.id,
                    parent = %parent,
                    "parent question not found, treating as root"
                );
                node.parent_id = None;
            }
        }
        links.push((node.parent_id.clone(), node.id.clone()));
        forest.slots.insert(
            node.id.clone(),
            Slot {
                node,
                children: Vec::new(),
            },
        );
    }

    for (parent, id) in links {
        match parent {
            Some(p) => {
                if let Some(slot) = forest.slots.get_mut(&p) {
                    slot.children.push(id);
                }
            }
            None => forest.roots.push(id),
        }
    }

    let orders: HashMap<String, usize> = forest
        .slots
        .iter()
        .map(|(id, slot)| (id.clone(), slot.node.order))
        .collect();
    let by_order = |a: &String, b: &String| orders[a].cmp(&orders[b]);
    forest.roots.sort_by(by_order);
    for slot in forest.slots.values_mut() {
        slot.children.sort_by(by_order);
    }

    let reachable = forest.depth_first().len();
    if reachable != forest.len() {
        let seen: HashSet<&str> = forest
            .depth_first()
            .into_iter()
            .map(|(_, n)| n.id.as_str())
            .collect();
        let stuck = input_order
            .into_iter()
            .find(|id| !seen.contains(id.as_str()))
            .unwrap_or_default();
        return Err(HierarchyError::Cycle(stuck));
    }

    Ok(forest)
}
