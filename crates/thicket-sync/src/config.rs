//! `thicket.toml` configuration

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thicket_ai::GeneratorConfig;

pub const CONFIG_FILE: &str = "thicket.toml";

/// Indexer settings. Every field has a default and the file itself is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Globs (workspace-relative) limiting blast-radius expansion. Empty matches everything.
    pub include: Vec<String>,
    /// Save `.thicket/graph.bin` after each pass.
    pub persist_graph: bool,
    /// Watcher quiet period before a batch is indexed.
    pub debounce_ms: u64,
    pub parser_workers: usize,
    pub generator: GeneratorConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            persist_graph: true,
            debounce_ms: 500,
            parser_workers: thicket_parser::default_workers(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl IndexerConfig {
    /// Load `thicket.toml` from the workspace root, falling back to defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, root.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&text)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| IndexError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for pattern in &self.include {
            globset::Glob::new(pattern)
                .map_err(|e| IndexError::Config(format!("include pattern {pattern:?}: {e}")))?;
        }
        if self.debounce_ms == 0 {
            return Err(IndexError::Config("debounce_ms must be greater than 0".to_string()));
        }
        if self.parser_workers == 0 {
            return Err(IndexError::Config("parser_workers must be greater than 0".to_string()));
        }
        Ok(())
    }
}
