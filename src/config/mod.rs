//! Configuration module for insights
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{
    GeminiSettings, GeneralSettings, LlmSettings, OllamaSettings, Settings, GEMINI_KEYS_ENV,
};
