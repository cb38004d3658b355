//! The `quiztree export` command.

use std::path::PathBuf;

use anyhow::Result;

use quiztree_core::serializer::write_export;

pub fn execute(file: PathBuf, output: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let store = super::load_store(&file)?;

    let dir = match output {
        Some(dir) => dir,
        None => quiztree_client::config::load_config_from(config_path.as_deref())?.export_dir,
    };

    let path = write_export(store.forest(), &dir)?;
    println!("Exported {} question(s) to {}", store.len(), path.display());
    Ok(())
}
