//! Client configuration and backend factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quiztree_core::traits::{FileUploader, TestRepository};

use crate::fs::{FileTestRepository, LocalUploader};
use crate::http::{HttpTestRepository, HttpUploader, DEFAULT_TIMEOUT_SECS};

/// Top-level quiztree configuration.
///
/// Debug output masks the API token.
#[derive(Clone, Serialize, Deserialize)]
pub struct QuiztreeConfig {
    /// LMS API base URL. When unset, tests and uploads stay on local disk.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Bearer token for the LMS API.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Directory for locally stored tests.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory for locally stored attachments.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Directory export files are written to.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    /// HTTP request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for QuiztreeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuiztreeConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .field("data_dir", &self.data_dir)
            .field("upload_dir", &self.upload_dir)
            .field("export_dir", &self.export_dir)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./quiztree-data/tests")
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("./quiztree-data/uploads")
}
fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for QuiztreeConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            data_dir: default_data_dir(),
            upload_dir: default_upload_dir(),
            export_dir: default_export_dir(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

/// Expand `${VAR}` references and drop values that end up empty.
fn resolve_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| resolve_env_vars(&v))
        .filter(|v| !v.trim().is_empty())
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quiztree.toml` in the current directory
/// 2. `~/.config/quiztree/config.toml`
///
/// Environment variable overrides: `QUIZTREE_API_URL`, `QUIZTREE_API_TOKEN`.
pub fn load_config() -> Result<QuiztreeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuiztreeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("quiztree.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<QuiztreeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => QuiztreeConfig::default(),
    };

    if let Ok(url) = std::env::var("QUIZTREE_API_URL") {
        config.api_base_url = Some(url);
    }
    if let Ok(token) = std::env::var("QUIZTREE_API_TOKEN") {
        config.api_token = Some(token);
    }

    config.api_base_url = resolve_optional(config.api_base_url);
    config.api_token = resolve_optional(config.api_token);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quiztree"))
}

/// Create the test repository the configuration selects.
pub fn create_repository(config: &QuiztreeConfig) -> Result<Box<dyn TestRepository>> {
    match &config.api_base_url {
        Some(url) => Ok(Box::new(HttpTestRepository::new(
            url,
            config.api_token.clone(),
            config.timeout_secs,
        )?)),
        None => Ok(Box::new(FileTestRepository::new(&config.data_dir))),
    }
}

/// Create the attachment uploader the configuration selects.
pub fn create_uploader(config: &QuiztreeConfig) -> Result<Box<dyn FileUploader>> {
    match &config.api_base_url {
        Some(url) => Ok(Box::new(HttpUploader::new(
            url,
            config.api_token.clone(),
            config.timeout_secs,
        )?)),
        None => Ok(Box::new(LocalUploader::new(&config.upload_dir))),
    }
}
