//! The `quiztree grade` command.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quiztree_core::grading::{grade_submission, GradeStatus, Response};

pub fn execute(file: PathBuf, responses_path: PathBuf, format: String) -> Result<()> {
    let store = super::load_store(&file)?;

    let text = std::fs::read_to_string(&responses_path)
        .with_context(|| format!("failed to read {}", responses_path.display()))?;
    let responses: HashMap<String, Response> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse responses: {}", responses_path.display()))?;

    let unknown = responses
        .keys()
        .filter(|id| store.get(id).is_none())
        .count();
    if unknown > 0 {
        tracing::warn!(unknown, "responses reference questions not in the file");
    }

    let result = grade_submission(store.forest(), &responses);

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "text" => {
            let mut table = Table::new();
            table.set_header(vec!["Question", "Status", "Earned", "Possible"]);
            for (id, grade) in &result.grades {
                let question = store.get(id).map(|n| n.question.as_str()).unwrap_or(id);
                table.add_row(vec![
                    Cell::new(question),
                    Cell::new(status_label(grade.status)),
                    Cell::new(grade.earned),
                    Cell::new(grade.possible),
                ]);
            }
            println!("{table}");
            println!(
                "\nScore: {}/{} ({:.1}%)",
                result.earned,
                result.possible,
                result.percentage()
            );
            let pending = result.needs_review();
            if pending > 0 {
                println!("{pending} question(s) need manual review.");
            }
        }
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }

    Ok(())
}

fn status_label(status: GradeStatus) -> &'static str {
    match status {
        GradeStatus::Correct => "correct",
        GradeStatus::Incorrect => "incorrect",
        GradeStatus::Unanswered => "unanswered",
        GradeStatus::NeedsReview => "needs review",
    }
}
