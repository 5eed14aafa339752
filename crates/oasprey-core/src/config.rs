//! Project configuration for contract checks

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// OpenAPI document path (local file)
    pub spec: PathBuf,

    /// Recorded interactions to check (JSON array or JSON Lines)
    #[serde(default)]
    pub interactions: Option<PathBuf>,

    /// Status codes whose interactions are not checked
    #[serde(default)]
    pub skip_statuses: Vec<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec: PathBuf::from("openapi.yaml"),
            interactions: None,
            skip_statuses: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.oasprey.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_default_in(Path::new("."))
    }

    /// Load the first default config file found in `dir`.
    pub fn load_default_in(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [".oasprey.toml", ".oasprey.json", "oasprey.toml"];

        for name in candidates {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        // No config file, return default
        Ok(Self::default())
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# oasprey configuration

# OpenAPI document (local file path, YAML or JSON)
spec = "openapi.yaml"

# Recorded interactions to check with `oasprey check`
# (JSON array or JSON Lines of {status, req: {method, path}, body} objects)
# interactions = "recorded/interactions.jsonl"

# Status codes to leave unchecked
# skip_statuses = [500, 502]
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
