//! Local filesystem backends.
//!
//! Tests are stored as one pretty-printed JSON file each; attachments are
//! copied into an upload directory and referenced by `file://` URL.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tracing::instrument;

use quiztree_core::draft::TestDraft;
use quiztree_core::traits::{FileUploader, TestRepository};

use crate::error::ClientError;

/// Reject ids that could escape the data directory.
fn check_id(id: &str) -> Result<(), ClientError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ClientError::NotFound(id.to_string()))
    }
}

/// Keep only characters that are safe in a file name.
fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Stores each test as `<data_dir>/<id>.json`.
pub struct FileTestRepository {
    dir: PathBuf,
}

impl FileTestRepository {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn write(&self, id: &str, draft: &TestDraft) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let json = serde_json::to_string_pretty(draft)?;
        let path = self.path_for(id);
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl TestRepository for FileTestRepository {
    fn name(&self) -> &str {
        "filesystem"
    }

    #[instrument(skip(self, draft), fields(dir = %self.dir.display()))]
    async fn create_test(&self, draft: &TestDraft) -> anyhow::Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.write(&id, draft).await?;
        tracing::info!(%id, "stored test");
        Ok(id)
    }

    #[instrument(skip(self, draft))]
    async fn update_test(&self, id: &str, draft: &TestDraft) -> anyhow::Result<()> {
        check_id(id)?;
        if !self.path_for(id).exists() {
            return Err(ClientError::NotFound(id.to_string()).into());
        }
        self.write(id, draft).await
    }

    #[instrument(skip(self))]
    async fn load_test(&self, id: &str) -> anyhow::Result<TestDraft> {
        check_id(id)?;
        let path = self.path_for(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClientError::NotFound(id.to_string()).into());
            }
            Err(e) => return Err(ClientError::Io(e.to_string()).into()),
        };
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }
}

/// Copies uploads into a local directory.
pub struct LocalUploader {
    dir: PathBuf,
}

impl LocalUploader {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl FileUploader for LocalUploader {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let stored = format!(
            "{}-{}",
            uuid::Uuid::new_v4().simple(),
            sanitize_file_name(file_name)
        );
        let path = self.dir.join(stored);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        let absolute = std::path::absolute(&path)
            .with_context(|| format!("failed to resolve {}", path.display()))?;
        Ok(format!("file://{}", absolute.display()))
    }
}
