//! Sibling reordering and `order` renumbering.
//!
//! Every structural change ends with a renumber so that each sibling group's
//! `order` values are exactly `0..n` in list order. Drag-and-drop resolves to
//! the same index move as manual reordering.

use crate::hierarchy::QuestionForest;

/// Move `items[from]` to index `to`, shifting the items between.
///
/// Returns `false` and leaves `items` unchanged if either index is out of range.
pub fn move_index<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    if from != to {
        let item = items.remove(from);
        items.insert(to, item);
    }
    true
}

/// Rewrite `order` for one sibling group to match list positions.
pub fn renumber(forest: &mut QuestionForest, parent: Option<&str>) {
    let ids = forest.siblings(parent).to_vec();
    for (position, id) in ids.iter().enumerate() {
        if let Some(node) = forest.get_mut(id) {
            node.order = position;
        }
    }
}

/// Rewrite `order` for every sibling group in the forest.
pub fn renumber_all(forest: &mut QuestionForest) {
    renumber(forest, None);
    let parents: Vec<String> = forest.ids().cloned().collect();
    for parent in &parents {
        renumber(forest, Some(parent));
    }
}

/// Move within one sibling group and renumber it.
pub fn move_in_group(
    forest: &mut QuestionForest,
    parent: Option<&str>,
    from: usize,
    to: usize,
) -> bool {
    let Some(group) = forest.siblings_mut(parent) else {
        return false;
    };
    if !move_index(group, from, to) {
        return false;
    }
    renumber(forest, parent);
    true
}

/// Resolve a drag of `active` onto `over` to a `(from, to)` index pair.
///
/// Both ids must belong to `siblings`.
pub fn drop_indices(siblings: &[String], active: &str, over: &str) -> Option<(usize, usize)> {
    let from = siblings.iter().position(|id| id == active)?;
    let to = siblings.iter().position(|id| id == over)?;
    Some((from, to))
}

/// Whether every sibling group's `order` values are exactly `0..n` in list order.
pub fn is_consistent(forest: &QuestionForest) -> bool {
    let group_ok = |ids: &[String]| {
        ids.iter()
            .enumerate()
            .all(|(position, id)| forest.get(id).is_some_and(|n| n.order == position))
    };
    group_ok(forest.roots()) && forest.ids().all(|id| group_ok(forest.children(id)))
}
