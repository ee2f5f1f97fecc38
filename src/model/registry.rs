use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::architecture::{Architecture, Metric};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointInfo {
    pub architecture: Architecture,
    pub metric: Metric,
    pub quality: u8,
    pub url: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub downloaded_at: String,
}

/// Manifest of downloaded checkpoints, keyed by file name.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CheckpointRegistry {
    checkpoints: BTreeMap<String, CheckpointInfo>,
}

impl CheckpointRegistry {
    pub fn load(config: &Config) -> Result<Self> {
        if !config.manifest_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config.manifest_path)?;
        let registry: CheckpointRegistry = toml::from_str(&content)?;
        Ok(registry)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(&config.manifest_path, content)?;
        Ok(())
    }

    pub fn add_checkpoint(&mut self, checkpoint: CheckpointInfo) {
        let key = checkpoint
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| checkpoint.url.clone());
        self.checkpoints.insert(key, checkpoint);
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.checkpoints.contains_key(file_name)
    }

    pub fn get_checkpoint(&self, file_name: &str) -> Result<&CheckpointInfo> {
        self.checkpoints
            .get(file_name)
            .ok_or_else(|| Error::ModelLoadFailed(format!("Checkpoint not installed: {}", file_name)))
    }

    pub fn list_checkpoints(&self) -> Vec<&CheckpointInfo> {
        self.checkpoints.values().collect()
    }
}
