//! Configuration management
//!
//! Manages generation settings (model, endpoint, timeout) and the storage
//! location. The API key itself lives in the keyring, never in this file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::agent::llm::{ModelChoice, GROQ_BASE_URL};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Text generation settings
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Record store settings
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model used for roadmaps, feedback replies and reconciliation
    #[serde(default)]
    pub model: ModelChoice,
    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    GROQ_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    2048
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: ModelChoice::default(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `<kind>_<id>.json` records
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(crate::store::DEFAULT_DATA_DIR)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load configuration from the default file, writing defaults if it is missing
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Config::default();
            config.save_to(&path)?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("Config path has no parent")?;
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "roadmap-agent", "roadmap-agent")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;
    let has_key = crate::security::keyring::get_api_key().is_some();

    println!("Configuration ({})", config_path()?.display());
    println!("  model:        {}", config.generation.model);
    println!("  base_url:     {}", config.generation.base_url);
    println!("  timeout_secs: {}", config.generation.timeout_secs);
    println!("  max_tokens:   {}", config.generation.max_tokens);
    println!("  data_dir:     {}", config.storage.data_dir.display());
    println!(
        "  generation:   {}",
        if has_key { "remote model (API key found)" } else { "templates (no API key)" }
    );
    Ok(())
}

/// Set the generation model
pub fn set_model(model: &str) -> Result<()> {
    let choice = ModelChoice::parse(model).with_context(|| {
        let names: Vec<&str> = ModelChoice::all().iter().map(|m| m.id()).collect();
        format!("Unknown model '{}'. Available models: {}", model, names.join(", "))
    })?;

    let mut config = Config::load()?;
    config.generation.model = choice;
    config.save()?;
    println!("Model set to: {}", choice);
    Ok(())
}

/// Set API key
pub fn set_api_key(key: &str) -> Result<()> {
    crate::security::keyring::set_api_key(key)?;
    println!("API key stored securely.");
    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    Config::default().save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}
