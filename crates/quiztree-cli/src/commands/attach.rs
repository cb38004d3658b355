//! The `quiztree attach` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quiztree_client::config::{create_uploader, load_config_from};
use quiztree_core::attachment::upload_attachment;

pub async fn execute(
    file: PathBuf,
    question: String,
    attachment: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut store = super::load_store(&file)?;
    let config = load_config_from(config_path.as_deref())?;
    let uploader = create_uploader(&config)?;

    let bytes = std::fs::read(&attachment)
        .with_context(|| format!("failed to read {}", attachment.display()))?;
    let name = attachment
        .file_name()
        .and_then(|n| n.to_str())
        .context("attachment path has no file name")?;

    let url = upload_attachment(&mut store, uploader.as_ref(), &question, name, bytes).await?;

    let json = store.export_json()?;
    std::fs::write(&file, json).with_context(|| format!("failed to write {}", file.display()))?;
    println!("Attached {name} to {question}: {url}");
    Ok(())
}
