//! Collaborator traits for persistence and file upload.
//!
//! Implemented by the `quiztree-client` crate. The question tree never awaits
//! anything itself; these are called at the edges, before load and after
//! submit.

use async_trait::async_trait;

use crate::draft::TestDraft;

/// Storage for tests and their flattened questions.
#[async_trait]
pub trait TestRepository: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// Store a new test. Returns its identifier.
    async fn create_test(&self, draft: &TestDraft) -> anyhow::Result<String>;

    /// Overwrite an existing test.
    async fn update_test(&self, id: &str, draft: &TestDraft) -> anyhow::Result<()>;

    /// Load a stored test for editing.
    async fn load_test(&self, id: &str) -> anyhow::Result<TestDraft>;
}

/// Upload target for files embedded in question text.
#[async_trait]
pub trait FileUploader: Send + Sync {
    /// Upload a file. Returns the URL it can be linked from.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> anyhow::Result<String>;
}
