// Reconciliation settings, loadable from a JSON file

use crate::track::ConsistencyMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Lenient (default) or strict field comparison
    #[serde(default)]
    pub mode: ConsistencyMode,

    /// Tracks that must be present before an identity is merged (default: 1)
    #[serde(default = "default_min_tracks")]
    pub min_tracks: usize,
}

fn default_min_tracks() -> usize {
    1
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            mode: ConsistencyMode::default(),
            min_tracks: default_min_tracks(),
        }
    }
}

impl ReconcileConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ReconcileConfig =
            serde_json::from_str(json).context("Invalid reconcile config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    /// A swipe has at most three tracks
    pub fn validate(&self) -> Result<()> {
        if self.min_tracks > 3 {
            anyhow::bail!("min_tracks must be between 0 and 3, got {}", self.min_tracks);
        }
        Ok(())
    }
}
