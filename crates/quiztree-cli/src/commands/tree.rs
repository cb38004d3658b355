//! The `quiztree tree` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

const PREVIEW_CHARS: usize = 60;

pub fn execute(file: PathBuf) -> Result<()> {
    let store = super::load_store(&file)?;

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Type", "Points", "Id"]);

    let mut numbering: Vec<usize> = Vec::new();
    for (depth, node) in store.forest().depth_first() {
        numbering.truncate(depth + 1);
        if numbering.len() == depth + 1 {
            numbering[depth] += 1;
        } else {
            numbering.push(1);
        }
        let label = numbering
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(".");

        table.add_row(vec![
            Cell::new(label),
            Cell::new(format!("{}{}", "  ".repeat(depth), preview(&node.question))),
            Cell::new(node.question_type()),
            Cell::new(node.points),
            Cell::new(&node.id),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
