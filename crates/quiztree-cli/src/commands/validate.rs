//! The `quiztree validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quiztree_core::validation::validate_forest;

pub fn execute(file: PathBuf) -> Result<()> {
    let store = super::load_store(&file)?;
    let forest = store.forest();

    let sub_questions = forest.len() - forest.roots().len();
    println!(
        "{}: {} question(s), {} sub-question(s)",
        file.display(),
        forest.roots().len(),
        sub_questions
    );

    let issues = validate_forest(forest);
    for issue in &issues {
        println!("  [{}] WARNING: {}", issue.id, issue);
    }

    if issues.is_empty() {
        println!("All questions valid.");
    } else {
        println!("\n{} warning(s) found.", issues.len());
    }

    Ok(())
}
