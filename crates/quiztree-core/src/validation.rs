//! Structural rules shared by import and submission.
//!
//! The live editor tolerates half-filled questions; these rules run only when
//! questions cross a boundary (a file import or a save).

use std::fmt;

use serde::Serialize;

use crate::hierarchy::QuestionForest;
use crate::model::{MatchPair, QuestionNode, QuestionType};

/// A rule violation on one question of a forest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// 1-based pre-order position.
    pub position: usize,
    pub id: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "question {}: {}", self.position, self.message)
    }
}

/// Check the fields every question needs regardless of type.
pub fn check_common(text: &str, points: f64) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("question text is required".into());
    }
    if !points.is_finite() || points < 0.0 {
        return Err("points must be a non-negative number".into());
    }
    Ok(())
}

/// Check the fields a question type depends on.
pub fn check_structure(
    kind: QuestionType,
    options: &[String],
    match_pairs: &[MatchPair],
    reorder_items: &[String],
    blank_count: Option<u32>,
) -> Result<(), String> {
    match kind {
        QuestionType::MultipleChoice | QuestionType::MultiSelect if options.is_empty() => {
            Err(format!("{kind} question requires a non-empty options array"))
        }
        QuestionType::Matching if match_pairs.is_empty() => {
            Err(format!("{kind} question requires a non-empty matchPairs array"))
        }
        QuestionType::Reorder if reorder_items.is_empty() => Err(format!(
            "{kind} question requires a non-empty reorderItems array"
        )),
        QuestionType::FillInTheBlank if blank_count.unwrap_or(0) < 1 => {
            Err(format!("{kind} question requires blankCount of at least 1"))
        }
        _ => Ok(()),
    }
}

fn check_node(node: &QuestionNode) -> Result<(), String> {
    check_common(&node.question, node.points)?;
    check_structure(
        node.question_type(),
        &node.options,
        &node.match_pairs,
        &node.reorder_items,
        node.blank_count,
    )
}

/// Validate every question of a forest, in pre-order.
pub fn validate_forest(forest: &QuestionForest) -> Vec<ValidationIssue> {
    forest
        .depth_first()
        .into_iter()
        .enumerate()
        .filter_map(|(index, (_, node))| {
            check_node(node).err().map(|message| ValidationIssue {
                position: index + 1,
                id: node.id.clone(),
                message,
            })
        })
        .collect()
}
