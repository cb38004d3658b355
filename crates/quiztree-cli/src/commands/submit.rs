//! The `quiztree submit` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use quiztree_client::config::{create_repository, load_config_from};
use quiztree_core::draft::{TestDraft, TestMetadata};

pub async fn execute(
    file: PathBuf,
    title: String,
    description: String,
    due: Option<String>,
    time_limit: Option<u32>,
    test_id: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let store = super::load_store(&file)?;
    let config = load_config_from(config_path.as_deref())?;
    let repository = create_repository(&config)?;

    let metadata = TestMetadata {
        title,
        description,
        due_date: due.as_deref().map(parse_due).transpose()?,
        time_limit_minutes: time_limit,
    };

    let draft = TestDraft::from_store(metadata, &store)?;
    let id = draft.submit(repository.as_ref(), test_id.as_deref()).await?;
    if test_id.is_some() {
        println!("Updated test {id} via {}", repository.name());
    } else {
        println!("Created test {id} via {}", repository.name());
    }
    Ok(())
}

/// RFC 3339 timestamp, or a bare date meaning the end of that day in UTC.
fn parse_due(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("invalid due date: {text}"))?;
    let end_of_day = date
        .and_hms_opt(23, 59, 59)
        .with_context(|| format!("invalid due date: {text}"))?;
    Ok(end_of_day.and_utc())
}
