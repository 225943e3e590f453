//! Configuration for worlds and logging

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::ecs::StorageKind;
use crate::scheduler::DEFAULT_STATS_HISTORY;

/// How a world lays out its tables and how much run history it keeps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Backend for component types without an explicit choice
    #[serde(default)]
    pub default_storage: StorageKind,
    /// Per-component backend, keyed by short type name
    #[serde(default)]
    pub storage: HashMap<String, StorageKind>,
    /// Number of run reports kept for `recent_stats`
    #[serde(default = "default_stats_history")]
    pub stats_history: usize,
}

fn default_stats_history() -> usize {
    DEFAULT_STATS_HISTORY
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            default_storage: StorageKind::default(),
            storage: HashMap::new(),
            stats_history: default_stats_history(),
        }
    }
}

impl WorldConfig {
    /// Backend for the component registered under `name`
    pub fn storage_for(&self, name: &str) -> StorageKind {
        self.storage
            .get(name)
            .copied()
            .unwrap_or(self.default_storage)
    }

    /// Load configuration from YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read world config {}", path.display()))?;
        let config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown names fall back to `info`
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}
