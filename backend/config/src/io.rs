//! Config file loading.

use crate::schema::KunstbotConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "KUNSTBOT_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";

/// Resolve the config file path.
/// Priority: explicit path > `KUNSTBOT_CONFIG` > `./config/default.yaml`
pub fn config_file_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Read the raw YAML config as a JSON value tree.
///
/// A missing file yields an empty object so the environment alone can configure the server.
pub async fn load_config_value(path: &Path) -> Result<serde_json::Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using environment only");
        return Ok(serde_json::Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }

    let value: serde_json::Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(value)
}

/// Read and deserialize the config file without substitution or overrides.
pub async fn load_config(path: &Path) -> Result<KunstbotConfig> {
    let value = load_config_value(path).await?;
    serde_json::from_value(value)
        .with_context(|| format!("Invalid config structure in: {}", path.display()))
}
