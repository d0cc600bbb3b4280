//! CLI configuration handling
//!
//! Settings come from an optional YAML/JSON file; command-line flags and the
//! `CONFIG_PATH` environment variable override it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sharefetch_core::{Strategy, DEFAULT_OUTPUT_DIR, DEFAULT_TABLE_PATTERN};
use std::path::Path;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Connection to the sharing endpoint
    #[serde(default)]
    pub sharing: SharingConfig,

    /// Extraction defaults
    #[serde(default)]
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharingConfig {
    /// Path or URL of the sharing profile (the `CONFIG_PATH` value)
    #[serde(default)]
    pub profile: Option<String>,

    /// HTTP request timeout in seconds (no timeout when unset)
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// `maxResults` for share/table listings (server default when unset)
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl SharingConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Table name pattern (regex, matched anywhere in the name)
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Directory for CSV files; must already exist
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// sequential or concurrent
    #[serde(default)]
    pub strategy: Strategy,

    /// Exit non-zero when any table fails
    #[serde(default)]
    pub fail_on_error: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            output_dir: default_output_dir(),
            strategy: Strategy::default(),
            fail_on_error: false,
        }
    }
}

fn default_pattern() -> String {
    DEFAULT_TABLE_PATTERN.to_string()
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

/// Load configuration from file or defaults, then apply the profile override
pub fn load_config(config_path: Option<&str>, profile: Option<&str>) -> Result<CliConfig> {
    let mut config = match config_path {
        Some(path) => load_from_file(path)?,
        None => {
            // Check for default config locations
            let default_locations = [
                ".sharefetch/config.yaml",
                ".sharefetch/config.yml",
                "sharefetch.yaml",
                "sharefetch.yml",
            ];

            match default_locations.iter().find(|l| Path::new(l).exists()) {
                Some(location) => load_from_file(location)?,
                None => CliConfig::default(),
            }
        }
    };

    if let Some(profile) = profile {
        config.sharing.profile = Some(profile.to_string());
    }

    Ok(config)
}

fn load_from_file(path: &str) -> Result<CliConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path))?;

    if path.ends_with(".yaml") || path.ends_with(".yml") {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path))
    } else if path.ends_with(".json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config: {}", path))
    } else {
        // Try YAML first, then JSON
        serde_yaml::from_str(&content)
            .or_else(|_| serde_json::from_str(&content))
            .with_context(|| format!("Failed to parse config file: {}", path))
    }
}
