//! Test metadata plus flattened questions, as handed to persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HierarchyError, SubmitError};
use crate::model::QuestionRecord;
use crate::store::QuestionStore;
use crate::traits::TestRepository;
use crate::validation::validate_forest;

/// Everything about a test except its questions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Time limit in minutes; `None` means untimed.
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
}

/// A test ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDraft {
    #[serde(flatten)]
    pub metadata: TestMetadata,
    /// Questions in pre-order.
    pub questions: Vec<QuestionRecord>,
}

impl TestDraft {
    /// Validate the store and flatten it together with the metadata.
    pub fn from_store(metadata: TestMetadata, store: &QuestionStore) -> Result<Self, SubmitError> {
        if metadata.title.trim().is_empty() {
            return Err(SubmitError::MissingTitle);
        }
        if store.is_empty() {
            return Err(SubmitError::NoQuestions);
        }
        let issues = validate_forest(store.forest());
        if !issues.is_empty() {
            return Err(SubmitError::Invalid(issues));
        }
        Ok(Self {
            metadata,
            questions: store.records(),
        })
    }

    /// Rebuild an editable store from the stored questions.
    pub fn to_store(&self) -> Result<QuestionStore, HierarchyError> {
        QuestionStore::from_records(self.questions.clone())
    }

    /// Create the test, or overwrite `existing` when editing. Returns the id.
    pub async fn submit(
        &self,
        repository: &dyn TestRepository,
        existing: Option<&str>,
    ) -> anyhow::Result<String> {
        let id = match existing {
            Some(id) => {
                repository.update_test(id, self).await?;
                id.to_string()
            }
            None => repository.create_test(self).await?,
        };
        tracing::info!(
            test = %id,
            backend = repository.name(),
            questions = self.questions.len(),
            "saved test"
        );
        Ok(id)
    }
}
