//! Automatic grading of student responses.
//!
//! Scoring is all-or-nothing per question. Essay, file-upload and code
//! questions are never auto-graded; neither is any question without a key.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::hierarchy::QuestionForest;
use crate::model::{Answer, MatchPair, QuestionNode};

const NUMERIC_TOLERANCE: f64 = 1e-6;

/// A student's response to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Flag(bool),
    Number(f64),
    Text(String),
    Pairs(Vec<MatchPair>),
    List(Vec<String>),
}

impl Response {
    fn is_blank(&self) -> bool {
        match self {
            Response::Text(s) => s.trim().is_empty(),
            Response::Pairs(p) => p.is_empty(),
            Response::List(l) => l.is_empty(),
            Response::Flag(_) | Response::Number(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    Correct,
    Incorrect,
    Unanswered,
    NeedsReview,
}

/// The outcome of grading one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub earned: f64,
    pub possible: f64,
    pub status: GradeStatus,
}

impl Grade {
    fn new(status: GradeStatus, possible: f64) -> Self {
        let earned = if status == GradeStatus::Correct {
            possible
        } else {
            0.0
        };
        Self {
            earned,
            possible,
            status,
        }
    }
}

/// Grade one response against a question's key.
pub fn grade_question(node: &QuestionNode, response: Option<&Response>) -> Grade {
    let possible = node.points;
    let response = match response {
        Some(r) if !r.is_blank() => r,
        _ => return Grade::new(GradeStatus::Unanswered, possible),
    };
    if node.question_type().needs_manual_review() {
        return Grade::new(GradeStatus::NeedsReview, possible);
    }
    let status = match check(node, response) {
        Some(true) => GradeStatus::Correct,
        Some(false) => GradeStatus::Incorrect,
        None => GradeStatus::NeedsReview,
    };
    Grade::new(status, possible)
}

/// `None` when the question has no usable key.
fn check(node: &QuestionNode, response: &Response) -> Option<bool> {
    let verdict = match (&node.answer, response) {
        (Answer::MultipleChoice(key), response) => {
            let key = key.as_deref().filter(|k| !k.trim().is_empty())?;
            match response {
                Response::Text(r) => r.trim() == key.trim(),
                Response::Number(i) => index_option(&node.options, *i) == Some(key),
                _ => false,
            }
        }
        (Answer::MultiSelect(key), response) => {
            if key.is_empty() {
                return None;
            }
            match response {
                Response::List(r) => same_set(key, r),
                Response::Text(r) => same_set(key, std::slice::from_ref(r)),
                _ => false,
            }
        }
        (Answer::TrueFalse(key), response) => {
            let key = (*key)?;
            match response {
                Response::Flag(r) => *r == key,
                Response::Text(r) => r.trim().parse::<bool>().ok() == Some(key),
                _ => false,
            }
        }
        (Answer::ShortAnswer(key), Response::Text(r)) => {
            if key.trim().is_empty() {
                return None;
            }
            r.trim().eq_ignore_ascii_case(key.trim())
        }
        (Answer::Matching(key), response) => {
            let key = if key.is_empty() { &node.match_pairs } else { key };
            if key.is_empty() {
                return None;
            }
            match response {
                Response::Pairs(r) => {
                    key.iter().collect::<HashSet<_>>() == r.iter().collect::<HashSet<_>>()
                }
                _ => false,
            }
        }
        (Answer::Reorder(key), response) => {
            let key = if key.is_empty() {
                &node.reorder_items
            } else {
                key
            };
            if key.is_empty() {
                return None;
            }
            match response {
                Response::List(r) => {
                    r.len() == key.len() && r.iter().zip(key).all(|(a, b)| a.trim() == b.trim())
                }
                _ => false,
            }
        }
        (Answer::FillInTheBlank(key), response) => {
            if key.is_empty() {
                return None;
            }
            let given: &[String] = match response {
                Response::List(r) => r,
                Response::Text(r) => std::slice::from_ref(r),
                _ => return Some(false),
            };
            given.len() == key.len()
                && given
                    .iter()
                    .zip(key)
                    .all(|(a, b)| a.trim().eq_ignore_ascii_case(b.trim()))
        }
        (Answer::Numeric(key), response) => {
            let key = (*key)?;
            let given = match response {
                Response::Number(n) => Some(*n),
                Response::Text(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            given.is_some_and(|n| (n - key).abs() <= NUMERIC_TOLERANCE)
        }
        (Answer::ShortAnswer(_), _) => false,
        (Answer::Essay(_) | Answer::FileUpload | Answer::Code(_), _) => return None,
    };
    Some(verdict)
}

fn index_option(options: &[String], index: f64) -> Option<&str> {
    if index < 0.0 || index.fract() != 0.0 {
        return None;
    }
    options.get(index as usize).map(String::as_str)
}

fn same_set(key: &[String], given: &[String]) -> bool {
    let key: HashSet<&str> = key.iter().map(|s| s.trim()).collect();
    let given: HashSet<&str> = given.iter().map(|s| s.trim()).collect();
    key == given
}

/// Grades for a whole test.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionGrade {
    /// `(question id, grade)` in pre-order.
    pub grades: Vec<(String, Grade)>,
    pub earned: f64,
    pub possible: f64,
}

impl SubmissionGrade {
    /// Questions awaiting a person's judgement.
    pub fn needs_review(&self) -> usize {
        self.grades
            .iter()
            .filter(|(_, g)| g.status == GradeStatus::NeedsReview)
            .count()
    }

    /// Earned share of possible points, as a percentage.
    pub fn percentage(&self) -> f64 {
        if self.possible > 0.0 {
            self.earned / self.possible * 100.0
        } else {
            0.0
        }
    }
}

/// Grade every question of a forest. Responses are keyed by question id.
pub fn grade_submission(
    forest: &QuestionForest,
    responses: &HashMap<String, Response>,
) -> SubmissionGrade {
    let grades: Vec<(String, Grade)> = forest
        .depth_first()
        .into_iter()
        .map(|(_, node)| (node.id.clone(), grade_question(node, responses.get(&node.id))))
        .collect();
    let earned = grades.iter().map(|(_, g)| g.earned).sum();
    let possible = grades.iter().map(|(_, g)| g.possible).sum();
    SubmissionGrade {
        grades,
        earned,
        possible,
    }
}
