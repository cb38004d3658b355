//! Error types for question import, hierarchy reconstruction, and submission.
//!
//! Store mutations never fail; everything that can fail is an exchange with
//! data the editor does not control.

use thiserror::Error;

use crate::validation::ValidationIssue;

/// Structural problems found while rebuilding a tree from a flat list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// Two records share the same id.
    #[error("duplicate question id: {0}")]
    DuplicateId(String),

    /// A `parentId` chain loops back on itself.
    #[error("cyclic parent reference involving question {0}")]
    Cycle(String),
}

/// Errors from importing a question list.
///
/// Import is all-or-nothing: the first failure rejects the whole document.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The text is not valid JSON.
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document has no usable `questions` array.
    #[error("invalid format: {0}")]
    Schema(String),

    /// A required scalar field is absent or invalid.
    #[error("question {position}: {message}")]
    MissingField { position: usize, message: String },

    /// A field required by the question's type is absent or empty.
    #[error("question {position}: {message}")]
    TypeSpecific { position: usize, message: String },

    /// The questions do not form a valid tree.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

impl ImportError {
    /// 1-based position of the offending question, if the error concerns one.
    pub fn position(&self) -> Option<usize> {
        match self {
            ImportError::MissingField { position, .. }
            | ImportError::TypeSpecific { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Errors from preparing a test for persistence.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("test title is required")]
    MissingTitle,

    #[error("a test needs at least one question")]
    NoQuestions,

    #[error("{} question(s) failed validation: {}", .0.len(), summarize(.0))]
    Invalid(Vec<ValidationIssue>),
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_reported_for_question_errors() {
        let err = ImportError::TypeSpecific {
            position: 3,
            message: "MATCHING question requires matchPairs".into(),
        };
        assert_eq!(err.position(), Some(3));
        assert_eq!(
            err.to_string(),
            "question 3: MATCHING question requires matchPairs"
        );
        assert_eq!(ImportError::Schema("x".into()).position(), None);
    }

    #[test]
    fn submit_error_lists_issues() {
        let err = SubmitError::Invalid(vec![ValidationIssue {
            position: 2,
            id: "q2".into(),
            message: "question text is required".into(),
        }]);
        let text = err.to_string();
        assert!(text.starts_with("1 question(s) failed validation"));
        assert!(text.contains("question 2"));
    }
}
