//! Core data model types for quiztree.
//!
//! A test is a forest of [`QuestionNode`]s. A node's question type is carried
//! by its [`Answer`] variant, so the type and the answer shape can never
//! disagree.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    MultipleChoice,
    MultiSelect,
    TrueFalse,
    ShortAnswer,
    Essay,
    FileUpload,
    Code,
    Matching,
    Reorder,
    FillInTheBlank,
    Numeric,
}

impl QuestionType {
    /// Every question type, in display order.
    pub const ALL: [QuestionType; 11] = [
        QuestionType::MultipleChoice,
        QuestionType::MultiSelect,
        QuestionType::TrueFalse,
        QuestionType::ShortAnswer,
        QuestionType::Essay,
        QuestionType::FileUpload,
        QuestionType::Code,
        QuestionType::Matching,
        QuestionType::Reorder,
        QuestionType::FillInTheBlank,
        QuestionType::Numeric,
    ];

    /// The wire name, e.g. `MULTIPLE_CHOICE`.
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionType::MultiSelect => "MULTI_SELECT",
            QuestionType::TrueFalse => "TRUE_FALSE",
            QuestionType::ShortAnswer => "SHORT_ANSWER",
            QuestionType::Essay => "ESSAY",
            QuestionType::FileUpload => "FILE_UPLOAD",
            QuestionType::Code => "CODE",
            QuestionType::Matching => "MATCHING",
            QuestionType::Reorder => "REORDER",
            QuestionType::FillInTheBlank => "FILL_IN_THE_BLANK",
            QuestionType::Numeric => "NUMERIC",
        }
    }

    /// Exact match against the wire name. Used for untrusted input.
    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Whether answers to this type must be graded by a person.
    pub fn needs_manual_review(self) -> bool {
        matches!(
            self,
            QuestionType::Essay | QuestionType::FileUpload | QuestionType::Code
        )
    }

    /// Whether this type requires a non-empty `options` list.
    pub fn uses_options(self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::MultiSelect)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        Self::from_wire(&normalized).ok_or_else(|| format!("unknown question type: {s}"))
    }
}

/// One left/right pair of a MATCHING question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

impl MatchPair {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// The correct answer of a question, one variant per question type.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Text of the correct option.
    MultipleChoice(Option<String>),
    /// Texts of every correct option.
    MultiSelect(Vec<String>),
    TrueFalse(Option<bool>),
    ShortAnswer(String),
    /// Model answer or rubric notes.
    Essay(String),
    FileUpload,
    /// Reference solution.
    Code(String),
    /// Correct pairing. Empty means `match_pairs` is the key.
    Matching(Vec<MatchPair>),
    /// Correct sequence. Empty means `reorder_items` is the key.
    Reorder(Vec<String>),
    /// One expected value per blank.
    FillInTheBlank(Vec<String>),
    Numeric(Option<f64>),
}

impl Answer {
    /// The blank answer for a question type.
    pub fn empty(kind: QuestionType) -> Self {
        match kind {
            QuestionType::MultipleChoice => Answer::MultipleChoice(None),
            QuestionType::MultiSelect => Answer::MultiSelect(Vec::new()),
            QuestionType::TrueFalse => Answer::TrueFalse(None),
            QuestionType::ShortAnswer => Answer::ShortAnswer(String::new()),
            QuestionType::Essay => Answer::Essay(String::new()),
            QuestionType::FileUpload => Answer::FileUpload,
            QuestionType::Code => Answer::Code(String::new()),
            QuestionType::Matching => Answer::Matching(Vec::new()),
            QuestionType::Reorder => Answer::Reorder(Vec::new()),
            QuestionType::FillInTheBlank => Answer::FillInTheBlank(Vec::new()),
            QuestionType::Numeric => Answer::Numeric(None),
        }
    }

    pub fn question_type(&self) -> QuestionType {
        match self {
            Answer::MultipleChoice(_) => QuestionType::MultipleChoice,
            Answer::MultiSelect(_) => QuestionType::MultiSelect,
            Answer::TrueFalse(_) => QuestionType::TrueFalse,
            Answer::ShortAnswer(_) => QuestionType::ShortAnswer,
            Answer::Essay(_) => QuestionType::Essay,
            Answer::FileUpload => QuestionType::FileUpload,
            Answer::Code(_) => QuestionType::Code,
            Answer::Matching(_) => QuestionType::Matching,
            Answer::Reorder(_) => QuestionType::Reorder,
            Answer::FillInTheBlank(_) => QuestionType::FillInTheBlank,
            Answer::Numeric(_) => QuestionType::Numeric,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Answer::MultipleChoice(a) => a.as_deref().map_or(true, |s| s.trim().is_empty()),
            Answer::MultiSelect(a) | Answer::Reorder(a) | Answer::FillInTheBlank(a) => {
                a.is_empty()
            }
            Answer::TrueFalse(a) => a.is_none(),
            Answer::ShortAnswer(a) | Answer::Essay(a) | Answer::Code(a) => a.trim().is_empty(),
            Answer::FileUpload => true,
            Answer::Matching(a) => a.is_empty(),
            Answer::Numeric(a) => a.is_none(),
        }
    }

    /// Convert this answer for a question whose type changed.
    ///
    /// Text carries over between the free-text types and choices carry over
    /// between single and multi select; anything else starts blank.
    pub fn converted_to(self, kind: QuestionType) -> Self {
        if self.question_type() == kind {
            return self;
        }
        match (self, kind) {
            (
                Answer::ShortAnswer(text) | Answer::Essay(text) | Answer::Code(text),
                QuestionType::ShortAnswer,
            ) => Answer::ShortAnswer(text),
            (
                Answer::ShortAnswer(text) | Answer::Essay(text) | Answer::Code(text),
                QuestionType::Essay,
            ) => Answer::Essay(text),
            (
                Answer::ShortAnswer(text) | Answer::Essay(text) | Answer::Code(text),
                QuestionType::Code,
            ) => Answer::Code(text),
            (Answer::MultipleChoice(choice), QuestionType::MultiSelect) => {
                Answer::MultiSelect(choice.into_iter().collect())
            }
            (Answer::MultiSelect(choices), QuestionType::MultipleChoice) => {
                Answer::MultipleChoice(choices.into_iter().next())
            }
            (_, kind) => Answer::empty(kind),
        }
    }

    /// Project to the loosely typed JSON shape used on the wire.
    pub fn to_value(&self) -> Value {
        match self {
            Answer::MultipleChoice(a) => a.as_ref().map_or(Value::Null, |s| json!(s)),
            Answer::MultiSelect(a) | Answer::Reorder(a) | Answer::FillInTheBlank(a) => json!(a),
            Answer::TrueFalse(a) => a.map_or(Value::Null, Value::Bool),
            Answer::ShortAnswer(a) | Answer::Essay(a) | Answer::Code(a) => json!(a),
            Answer::FileUpload => Value::Null,
            Answer::Matching(pairs) => json!(pairs),
            Answer::Numeric(a) => a.map_or(Value::Null, |n| json!(n)),
        }
    }

    /// Decode a wire answer for the given type.
    ///
    /// Returns `None` when the JSON shape does not fit the type. `null` always
    /// decodes to the empty answer.
    pub fn from_value(kind: QuestionType, value: &Value, options: &[String]) -> Option<Self> {
        if value.is_null() {
            return Some(Answer::empty(kind));
        }
        let answer = match kind {
            QuestionType::MultipleChoice => match value {
                Value::String(s) => Answer::MultipleChoice(Some(s.clone())),
                Value::Number(n) => {
                    let index = usize::try_from(n.as_u64()?).ok()?;
                    Answer::MultipleChoice(Some(options.get(index)?.clone()))
                }
                _ => return None,
            },
            QuestionType::MultiSelect => match value {
                Value::String(s) => Answer::MultiSelect(vec![s.clone()]),
                other => Answer::MultiSelect(string_list(other)?),
            },
            QuestionType::TrueFalse => match value {
                Value::Bool(b) => Answer::TrueFalse(Some(*b)),
                Value::String(s) => Answer::TrueFalse(Some(s.trim().parse::<bool>().ok()?)),
                _ => return None,
            },
            QuestionType::ShortAnswer => Answer::ShortAnswer(value.as_str()?.to_string()),
            QuestionType::Essay => Answer::Essay(value.as_str()?.to_string()),
            QuestionType::Code => Answer::Code(value.as_str()?.to_string()),
            QuestionType::FileUpload => Answer::FileUpload,
            QuestionType::Matching => match value {
                Value::Object(map) => Answer::Matching(
                    map.iter()
                        .map(|(left, right)| {
                            right.as_str().map(|r| MatchPair::new(left.clone(), r))
                        })
                        .collect::<Option<Vec<_>>>()?,
                ),
                other => {
                    Answer::Matching(serde_json::from_value::<Vec<MatchPair>>(other.clone()).ok()?)
                }
            },
            QuestionType::Reorder => Answer::Reorder(string_list(value)?),
            QuestionType::FillInTheBlank => match value {
                Value::String(s) => Answer::FillInTheBlank(vec![s.clone()]),
                other => Answer::FillInTheBlank(string_list(other)?),
            },
            QuestionType::Numeric => match value {
                Value::Number(n) => Answer::Numeric(Some(n.as_f64()?)),
                Value::String(s) => Answer::Numeric(Some(s.trim().parse::<f64>().ok()?)),
                _ => return None,
            },
        };
        Some(answer)
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Generate an id for a question created in the editor.
///
/// Format: `temp-<unix millis>-<9 random chars>`.
pub fn generate_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("temp-{}-{}", Utc::now().timestamp_millis(), &random[..9])
}

/// A single test question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionNode {
    /// Unique identifier across the whole forest.
    pub id: String,
    /// Markdown body.
    pub question: String,
    pub points: f64,
    pub options: Vec<String>,
    /// Correct answer; its variant is the question's type.
    pub answer: Answer,
    /// Programming language for CODE questions.
    pub language: Option<String>,
    pub match_pairs: Vec<MatchPair>,
    pub reorder_items: Vec<String>,
    pub blank_count: Option<u32>,
    /// Position among siblings, contiguous from 0.
    pub order: usize,
    /// `None` for root-level questions.
    pub parent_id: Option<String>,
}

impl QuestionNode {
    /// A blank multiple-choice question worth one point with four empty options.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: String::new(),
            points: 1.0,
            options: vec![String::new(); 4],
            answer: Answer::MultipleChoice(None),
            language: None,
            match_pairs: Vec::new(),
            reorder_items: Vec::new(),
            blank_count: None,
            order: 0,
            parent_id: None,
        }
    }

    pub fn question_type(&self) -> QuestionType {
        self.answer.question_type()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Project to the wire record.
    pub fn to_record(&self) -> QuestionRecord {
        QuestionRecord {
            id: Some(self.id.clone()),
            question: self.question.clone(),
            kind: self.question_type(),
            points: self.points,
            options: self.options.clone(),
            answer: self.answer.to_value(),
            language: self.language.clone(),
            match_pairs: self.match_pairs.clone(),
            reorder_items: self.reorder_items.clone(),
            blank_count: self.blank_count,
            order: self.order,
            parent_id: self.parent_id.clone(),
        }
    }
}

/// Flat, persistence-facing projection of a question.
///
/// Field order here is the field order of exported JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub points: f64,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: Value,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub match_pairs: Vec<MatchPair>,
    #[serde(default)]
    pub reorder_items: Vec<String>,
    #[serde(default)]
    pub blank_count: Option<u32>,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl QuestionRecord {
    /// Turn a stored record back into a node.
    ///
    /// A missing id is generated; an answer whose shape does not fit the type
    /// is logged and cleared.
    pub fn into_node(self) -> QuestionNode {
        let id = self.id.unwrap_or_else(generate_id);
        let answer = Answer::from_value(self.kind, &self.answer, &self.options).unwrap_or_else(|| {
            tracing::warn!(question = %id, kind = %self.kind, "answer does not fit question type, clearing");
            Answer::empty(self.kind)
        });
        QuestionNode {
            id,
            question: self.question,
            points: self.points,
            options: self.options,
            answer,
            language: self.language,
            match_pairs: self.match_pairs,
            reorder_items: self.reorder_items,
            blank_count: self.blank_count,
            order: self.order,
            parent_id: self.parent_id,
        }
    }
}
