//! JSON import and export of question lists.
//!
//! The exchange document is `{"questions": [ ... ]}` holding flat records in
//! pre-order, each referencing its parent by `parentId`. Import validates the
//! untrusted document question by question and rejects it as a whole on the
//! first failure.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ImportError;
use crate::hierarchy::{flatten, organize, QuestionForest};
use crate::model::{generate_id, Answer, MatchPair, QuestionNode, QuestionRecord, QuestionType};
use crate::reorder::renumber_all;
use crate::validation::{check_common, check_structure};

#[derive(Serialize)]
struct ExportDocument<'a> {
    questions: &'a [QuestionRecord],
}

/// One untrusted question element. Every field is kept as raw JSON so each
/// rule can report its own error.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawQuestion {
    id: Value,
    question: Value,
    #[serde(rename = "type")]
    kind: Value,
    points: Value,
    options: Value,
    answer: Value,
    language: Value,
    match_pairs: Value,
    reorder_items: Value,
    blank_count: Value,
    order: Value,
    parent_id: Value,
}

/// Flatten a forest into export records.
pub fn export_records(forest: &QuestionForest) -> Vec<QuestionRecord> {
    flatten(forest).iter().map(QuestionNode::to_record).collect()
}

/// Serialize a forest to the exchange document.
pub fn export_to_json(forest: &QuestionForest) -> serde_json::Result<String> {
    let records = export_records(forest);
    serde_json::to_string_pretty(&ExportDocument {
        questions: &records,
    })
}

/// File name for an export made on `date`: `test-questions-<YYYY-MM-DD>.json`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("test-questions-{}.json", date.format("%Y-%m-%d"))
}

/// Write an export into `dir` under today's export file name.
pub fn write_export(forest: &QuestionForest, dir: &Path) -> Result<PathBuf> {
    let json = export_to_json(forest).context("failed to serialize questions")?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory: {}", dir.display()))?;
    let path = dir.join(export_file_name(Utc::now().date_naive()));
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write export to {}", path.display()))?;
    tracing::info!(path = %path.display(), questions = forest.len(), "exported questions");
    Ok(path)
}

/// Parse and validate an exchange document into a flat node list.
pub fn parse_questions(text: &str) -> Result<Vec<QuestionNode>, ImportError> {
    let document: Value = serde_json::from_str(text)?;
    let elements = document
        .get("questions")
        .and_then(Value::as_array)
        .ok_or_else(|| ImportError::Schema("expected a top-level \"questions\" array".into()))?;
    if elements.is_empty() {
        return Err(ImportError::Schema("the \"questions\" array is empty".into()));
    }

    elements
        .iter()
        .enumerate()
        .map(|(index, element)| parse_question(index, element))
        .collect()
}

/// Import an exchange document into a renumbered forest.
pub fn import_from_json(text: &str) -> Result<QuestionForest, ImportError> {
    let nodes = parse_questions(text)?;
    let count = nodes.len();

    let mut seen = HashSet::with_capacity(count);
    if let Some(index) = nodes.iter().position(|n| !seen.insert(n.id.as_str())) {
        return Err(ImportError::MissingField {
            position: index + 1,
            message: format!("duplicate question id \"{}\"", nodes[index].id),
        });
    }

    let mut forest = organize(nodes)?;
    renumber_all(&mut forest);
    tracing::debug!(questions = count, roots = forest.roots().len(), "imported questions");
    Ok(forest)
}

fn parse_question(index: usize, element: &Value) -> Result<QuestionNode, ImportError> {
    let position = index + 1;
    let missing = |message: String| ImportError::MissingField { position, message };

    if !element.is_object() {
        return Err(missing("question must be a JSON object".into()));
    }
    let raw: RawQuestion = serde_json::from_value(element.clone())
        .map_err(|_| missing("question must be a JSON object".into()))?;

    let text = raw.question.as_str().unwrap_or_default().to_string();
    let kind = match raw.kind.as_str() {
        None => return Err(missing("type is required".into())),
        Some(name) => QuestionType::from_wire(name)
            .ok_or_else(|| missing(format!("unknown question type \"{name}\"")))?,
    };
    let points = raw
        .points
        .as_f64()
        .ok_or_else(|| missing("points must be a non-negative number".into()))?;
    check_common(&text, points).map_err(missing)?;

    let options = string_items(&raw.options);
    let match_pairs: Vec<MatchPair> =
        serde_json::from_value(raw.match_pairs.clone()).unwrap_or_default();
    let reorder_items = string_items(&raw.reorder_items);
    let blank_count = match (kind, blank_count(&raw.blank_count)) {
        (QuestionType::FillInTheBlank, Err(message)) => {
            return Err(ImportError::TypeSpecific { position, message });
        }
        (_, Ok(count)) => count,
        (_, Err(_)) => None,
    };
    check_structure(kind, &options, &match_pairs, &reorder_items, blank_count)
        .map_err(|message| ImportError::TypeSpecific { position, message })?;

    let order = match &raw.order {
        Value::Null => index,
        value => integral(value)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| missing("order must be a non-negative integer".into()))?,
    };

    let answer = Answer::from_value(kind, &raw.answer, &options).unwrap_or_else(|| {
        tracing::warn!(position, %kind, "answer does not fit question type, clearing");
        Answer::empty(kind)
    });

    Ok(QuestionNode {
        id: scalar_string(&raw.id).unwrap_or_else(generate_id),
        question: text,
        points,
        options,
        answer,
        language: raw.language.as_str().map(str::to_string),
        match_pairs,
        reorder_items,
        blank_count,
        order,
        parent_id: scalar_string(&raw.parent_id),
    })
}

/// A non-negative whole number, written either as an integer or as an
/// integral float such as `2.0`.
fn integral(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= u64::MAX as f64)
            .map(|n| n as u64)
    })
}

/// `blankCount` as stored. Zero and absence both read as `None`, which the
/// structural check reports.
fn blank_count(value: &Value) -> Result<Option<u32>, String> {
    if value.is_null() {
        return Ok(None);
    }
    let n = integral(value).ok_or_else(|| "blankCount must be a positive integer".to_string())?;
    let n = u32::try_from(n).map_err(|_| format!("blankCount {n} is too large"))?;
    Ok(Some(n).filter(|n| *n > 0))
}

/// Array elements rendered as strings. Anything but an array is empty.
fn string_items(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// A non-empty string or number as an id.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn import_single_multiple_choice() {
        let text = r#"{"questions":[{"question":"Q1","type":"MULTIPLE_CHOICE","points":5,"options":["A","B"],"answer":"A"}]}"#;
        let forest = import_from_json(text).unwrap();
        assert_eq!(forest.roots().len(), 1);
        let node = forest.get(&forest.roots()[0]).unwrap();
        assert_eq!(node.order, 0);
        assert_eq!(node.parent_id, None);
        assert_eq!(node.options, ["A", "B"]);
        assert_eq!(node.answer, Answer::MultipleChoice(Some("A".into())));
        assert!(node.id.starts_with("temp-"));
    }

    #[test]
    fn matching_without_pairs_is_type_specific_error() {
        let text = r#"{"questions":[{"question":"Q1","type":"MATCHING","points":5}]}"#;
        let err = import_from_json(text).unwrap_err();
        assert!(matches!(err, ImportError::TypeSpecific { position: 1, .. }));
        assert!(err.to_string().contains("matchPairs"));
    }

    #[test]
    fn invalid_type_reports_its_position() {
        let doc = json!({"questions": [
            {"question": "One", "type": "ESSAY", "points": 2},
            {"question": "Two", "type": "NUMERIC", "points": 1, "answer": 4},
            {"question": "Three", "type": "DRAWING", "points": 1},
        ]});
        let err = import_from_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, ImportError::MissingField { position: 3, .. }));
        assert_eq!(err.position(), Some(3));
        assert!(err.to_string().contains("DRAWING"));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            import_from_json("{not json"),
            Err(ImportError::Parse(_))
        ));
    }

    #[test]
    fn missing_or_empty_questions_is_schema_error() {
        for text in [r#"{}"#, r#"{"questions": {}}"#, r#"{"questions": []}"#, "[]"] {
            assert!(
                matches!(import_from_json(text), Err(ImportError::Schema(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn scalar_field_rules() {
        let cases = [
            json!({"type": "ESSAY", "points": 1}),
            json!({"question": "  ", "type": "ESSAY", "points": 1}),
            json!({"question": "Q", "points": 1}),
            json!({"question": "Q", "type": "ESSAY"}),
            json!({"question": "Q", "type": "ESSAY", "points": -2}),
            json!("just a string"),
        ];
        for case in cases {
            let doc = json!({ "questions": [case] });
            let err = import_from_json(&doc.to_string()).unwrap_err();
            assert!(
                matches!(err, ImportError::MissingField { position: 1, .. }),
                "{doc}: {err}"
            );
        }
    }

    #[test]
    fn type_specific_rules() {
        let cases = [
            json!({"question": "Q", "type": "MULTI_SELECT", "points": 1, "options": []}),
            json!({"question": "Q", "type": "MULTIPLE_CHOICE", "points": 1}),
            json!({"question": "Q", "type": "REORDER", "points": 1}),
            json!({"question": "Q", "type": "FILL_IN_THE_BLANK", "points": 1, "blankCount": 0}),
        ];
        for case in cases {
            let doc = json!({ "questions": [case] });
            let err = import_from_json(&doc.to_string()).unwrap_err();
            assert!(
                matches!(err, ImportError::TypeSpecific { position: 1, .. }),
                "{doc}: {err}"
            );
        }
    }

    #[test]
    fn hierarchy_and_order_defaults() {
        let doc = json!({"questions": [
            {"id": "p", "question": "Parent", "type": "ESSAY", "points": 0},
            {"id": "c2", "question": "Child 2", "type": "SHORT_ANSWER", "points": 1, "parentId": "p", "order": 7},
            {"id": "c1", "question": "Child 1", "type": "TRUE_FALSE", "points": 1, "parentId": "p", "order": 3, "answer": true},
            {"question": "Lost", "type": "ESSAY", "points": 1, "parentId": "nowhere"},
        ]});
        let forest = import_from_json(&doc.to_string()).unwrap();
        assert_eq!(forest.children("p"), ["c1", "c2"]);
        assert_eq!(forest.get("c1").unwrap().order, 0);
        assert_eq!(forest.get("c2").unwrap().order, 1);
        assert_eq!(forest.roots().len(), 2);
        assert_eq!(forest.get(&forest.roots()[1]).unwrap().question, "Lost");
    }

    #[test]
    fn cyclic_import_is_rejected() {
        let doc = json!({"questions": [
            {"id": "a", "question": "A", "type": "ESSAY", "points": 1, "parentId": "b"},
            {"id": "b", "question": "B", "type": "ESSAY", "points": 1, "parentId": "a"},
        ]});
        assert!(matches!(
            import_from_json(&doc.to_string()),
            Err(ImportError::Hierarchy(_))
        ));
    }

    #[test]
    fn duplicate_id_reports_second_occurrence() {
        let doc = json!({"questions": [
            {"id": "a", "question": "A", "type": "ESSAY", "points": 1},
            {"id": "b", "question": "B", "type": "ESSAY", "points": 1},
            {"id": "a", "question": "A again", "type": "ESSAY", "points": 1},
        ]});
        let err = import_from_json(&doc.to_string()).unwrap_err();
        assert_eq!(err.position(), Some(3));
        assert!(err.to_string().contains("duplicate question id \"a\""));
    }

    #[test]
    fn integral_float_blank_count_is_accepted() {
        let text = r#"{"questions":[{"question":"Fill","type":"FILL_IN_THE_BLANK","points":1,"blankCount":2.0}]}"#;
        let forest = import_from_json(text).unwrap();
        let node = forest.get(&forest.roots()[0]).unwrap();
        assert_eq!(node.blank_count, Some(2));
    }

    #[test]
    fn bad_blank_counts_have_their_own_messages() {
        let with_count = |count: Value| {
            json!({"questions": [
                {"question": "Fill", "type": "FILL_IN_THE_BLANK", "points": 1, "blankCount": count},
            ]})
            .to_string()
        };

        let err = import_from_json(&with_count(json!(5_000_000_000u64))).unwrap_err();
        assert!(matches!(err, ImportError::TypeSpecific { position: 1, .. }));
        assert!(err.to_string().contains("too large"));

        let err = import_from_json(&with_count(json!(1.5))).unwrap_err();
        assert!(err.to_string().contains("positive integer"));

        let err = import_from_json(&with_count(json!(0))).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn integral_float_order_is_honoured() {
        let doc = json!({"questions": [
            {"id": "a", "question": "A", "type": "ESSAY", "points": 1, "order": 1.0},
            {"id": "b", "question": "B", "type": "ESSAY", "points": 1, "order": 0.0},
        ]});
        let forest = import_from_json(&doc.to_string()).unwrap();
        assert_eq!(forest.roots(), ["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn malformed_order_is_rejected() {
        for order in [json!(-1), json!("2"), json!(0.5)] {
            let doc = json!({"questions": [
                {"question": "A", "type": "ESSAY", "points": 1},
                {"question": "B", "type": "ESSAY", "points": 1, "order": order},
            ]});
            let err = import_from_json(&doc.to_string()).unwrap_err();
            assert!(matches!(err, ImportError::MissingField { position: 2, .. }));
            assert!(err.to_string().contains("order must be a non-negative integer"));
        }
    }

    #[test]
    fn array_element_is_not_a_question() {
        let err = import_from_json(r#"{"questions":[["x","Q1","ESSAY",5]]}"#).unwrap_err();
        assert!(matches!(err, ImportError::MissingField { position: 1, .. }));
        assert!(err.to_string().contains("must be a JSON object"));
    }

    #[test]
    fn export_then_import_preserves_structure() {
        let doc = json!({"questions": [
            {"id": "p", "question": "Parent", "type": "MATCHING", "points": 2,
             "matchPairs": [{"left": "a", "right": "1"}]},
            {"id": "c", "question": "Child", "type": "FILL_IN_THE_BLANK", "points": 1,
             "blankCount": 2, "answer": ["x", "y"], "parentId": "p"},
        ]});
        let forest = import_from_json(&doc.to_string()).unwrap();
        let exported = export_to_json(&forest).unwrap();
        let again = import_from_json(&exported).unwrap();
        assert_eq!(flatten(&again), flatten(&forest));
    }

    #[test]
    fn export_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_file_name(date), "test-questions-2024-03-09.json");
    }

    #[test]
    fn write_export_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let text = r#"{"questions":[{"question":"Q1","type":"ESSAY","points":5}]}"#;
        let forest = import_from_json(text).unwrap();
        let path = write_export(&forest, dir.path()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"questions\""));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("test-questions-"));
    }
}
