use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn default_true() -> bool {
    true
}

/// Harvester configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HarvesterConfig {
    /// Resolve objects without creating or changing anything (dry run)
    #[serde(default)]
    pub no_shadow_commit: bool,
    /// Skip objects that have no file shadows attached
    #[serde(default)]
    pub require_files_on_objects: bool,
    /// Keep going with the next object when one fails
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            no_shadow_commit: false,
            require_files_on_objects: false,
            continue_on_error: default_true(),
        }
    }
}

impl HarvesterConfig {
    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            no_shadow_commit: self.no_shadow_commit,
            require_files_on_objects: self.require_files_on_objects,
        }
    }
}

/// Switches the commit engine consults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub no_shadow_commit: bool,
    pub require_files_on_objects: bool,
}

/// Read the configuration file
pub async fn read_config(config_path: &Path) -> Result<Option<HarvesterConfig>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(config_path).await?;
    let config: HarvesterConfig = serde_json::from_str(&content)?;
    Ok(Some(config))
}

/// Write the configuration file
pub async fn write_config(config_path: &Path, config: &HarvesterConfig) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(config)?;
    fs::write(config_path, content).await?;
    Ok(())
}
