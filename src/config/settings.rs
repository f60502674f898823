//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::credentials::{KeyProvider, KeysFile, StaticKeys};
use crate::llm::BackendKind;

/// Environment variable holding a comma separated Gemini key list.
pub const GEMINI_KEYS_ENV: &str = "INSIGHTS_GEMINI_API_KEYS";

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Backend selection
    #[serde(default)]
    pub llm: LlmSettings,

    /// Gemini backend settings
    #[serde(default)]
    pub gemini: GeminiSettings,

    /// Ollama backend settings
    #[serde(default)]
    pub ollama: OllamaSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Primary backend (gemini, ollama)
    #[serde(default)]
    pub backend: BackendKind,

    /// Backend to fall back to once the primary is rate limited on every key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<BackendKind>,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSettings {
    /// API base URL
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Ordered API key list
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// File with a JSON array or one key per line; takes precedence over `api_keys`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaSettings {
    /// Generate endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_secs() -> u64 {
    200
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_ollama_model() -> String {
    "gemma3".to_string()
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            fallback: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            endpoint: default_gemini_endpoint(),
            model: default_gemini_model(),
            api_keys: Vec::new(),
            keys_file: None,
        }
    }
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            endpoint: default_ollama_endpoint(),
            model: default_ollama_model(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let mut settings = Self::from_file(&config_path)?;
        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Parse a settings file without applying environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if self.gemini.api_keys.is_empty() {
            if let Ok(keys) = std::env::var(GEMINI_KEYS_ENV) {
                self.gemini.api_keys = split_key_list(&keys);
            }
        }
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "insights", "insights")
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &PathBuf) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Whether any configured backend draws on the Gemini key pool.
    pub fn uses_gemini(&self) -> bool {
        self.backends().contains(&BackendKind::Gemini)
    }

    /// Configured backends in dispatch order, primary first.
    pub fn backends(&self) -> Vec<BackendKind> {
        let mut backends = vec![self.llm.backend];
        if let Some(fallback) = self.llm.fallback {
            if fallback != self.llm.backend {
                backends.push(fallback);
            }
        }
        backends
    }

    /// Provider for the Gemini key list.
    pub fn key_provider(&self) -> Box<dyn KeyProvider> {
        match &self.gemini.keys_file {
            Some(path) => Box::new(KeysFile::new(path)),
            None => Box::new(StaticKeys(self.gemini.api_keys.clone())),
        }
    }
}

fn split_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
