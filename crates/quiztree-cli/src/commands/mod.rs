//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context, Result};

use quiztree_core::store::QuestionStore;

pub mod attach;
pub mod export;
pub mod grade;
pub mod init;
pub mod submit;
pub mod tree;
pub mod validate;

/// Read and import a questions file.
pub(crate) fn load_store(path: &Path) -> Result<QuestionStore> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut store = QuestionStore::new();
    store
        .import_json(&text)
        .with_context(|| format!("failed to import {}", path.display()))?;
    Ok(store)
}
