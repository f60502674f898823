//! CLI command implementations

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::cli::args::ConfigCommand;
use crate::client::InsightsClient;
use crate::config::Settings;
use crate::credentials::mask_key;
use crate::instance;

async fn client(settings: &Settings) -> Result<InsightsClient> {
    let handle = instance::instance_with(settings).await?;
    Ok(InsightsClient::new(handle))
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))
}

fn read_chat(path: &Path) -> Result<Value> {
    let content = read_input(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Chat file is not valid JSON: {}", path.display()))
}

/// Describe a whiteboard image
pub async fn describe_image(settings: &Settings, image: &Path, prompt: Option<&str>) -> Result<()> {
    if !image.exists() {
        anyhow::bail!("Image not found: {}", image.display());
    }

    let description = client(settings).await?.describe_file(image, prompt).await?;
    println!("{}", description);
    Ok(())
}

/// Regularise a freehand shape
pub async fn regularise_shape(settings: &Settings, shape: &Path) -> Result<()> {
    let shape_json = read_input(shape)?;
    serde_json::from_str::<Value>(&shape_json)
        .with_context(|| format!("Shape file is not valid JSON: {}", shape.display()))?;

    let regularised = client(settings).await?.regularise(&shape_json).await?;
    println!("{}", regularised);
    Ok(())
}

/// Print the sentiment time series of a chat
pub async fn chat_sentiment(settings: &Settings, chat: &Path) -> Result<()> {
    let chat = read_chat(chat)?;
    let series = client(settings).await?.sentiment(&chat).await?;
    println!("{}", series);
    Ok(())
}

/// Fold input files into a rolling summary
pub async fn summarize_files(settings: &Settings, inputs: &[PathBuf]) -> Result<()> {
    let client = client(settings).await?;

    let mut summary = String::new();
    for input in inputs {
        let content = read_input(input)?;
        eprintln!("Summarizing {}...", input.display());
        summary = client.summarise(&content).await?;
    }

    println!("{}", summary);
    Ok(())
}

/// Print action items from a chat
pub async fn chat_action_items(settings: &Settings, chat: &Path) -> Result<()> {
    let chat = read_chat(chat)?;
    let items = client(settings).await?.action_items(&chat).await?;
    println!("{}", items);
    Ok(())
}

/// Answer a question, summarising context files first
pub async fn ask_question(settings: &Settings, question: &str, context: &[PathBuf]) -> Result<()> {
    let client = client(settings).await?;

    for path in context {
        let content = read_input(path)?;
        client.summarise(&content).await?;
    }

    let answer = client.answer_question(question).await?;
    println!("{}", answer);
    Ok(())
}

#[derive(Serialize)]
struct KeyStatus {
    backends: Vec<String>,
    active_backend: &'static str,
    keys: usize,
    cursor: usize,
    current_key: String,
}

/// Show the key pool status
pub async fn show_keys(settings: &Settings, json: bool) -> Result<()> {
    let handle = instance::instance_with(settings).await?;

    let Some(pool) = handle.credential_pool() else {
        println!("No Gemini backend configured; no key pool in use");
        return Ok(());
    };

    let status = KeyStatus {
        backends: settings
            .backends()
            .iter()
            .map(|b| b.as_str().to_string())
            .collect(),
        active_backend: handle.orchestrator().active_service(),
        keys: pool.len(),
        cursor: pool.cursor(),
        current_key: mask_key(pool.current_key()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Backends: {}", status.backends.join(" -> "));
    println!("Active: {}", status.active_backend);
    println!("Keys: {}", status.keys);
    println!("Current key: {} (cursor {})", status.current_key, status.cursor);
    Ok(())
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let mut shown = settings.clone();
            shown.gemini.api_keys = shown.gemini.api_keys.iter().map(|k| mask_key(k)).collect();
            let toml = toml::to_string_pretty(&shown)?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}
