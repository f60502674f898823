//! insights - AI-powered meeting, chat and whiteboard insights
//!
//! Entry point for the insights CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use insights::cli::{commands, Cli, Commands};
use insights::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => {
            insights::cli::completions::print(shell);
        }
        command => {
            // Load configuration only for runtime commands.
            let settings = Settings::load()?;

            let level = if cli.verbose {
                "debug"
            } else {
                settings.general.log_level.as_str()
            };
            init_logging(level);

            match command {
                Commands::Describe { image, prompt } => {
                    commands::describe_image(&settings, &image, prompt.as_deref()).await?;
                }
                Commands::Regularise { shape } => {
                    commands::regularise_shape(&settings, &shape).await?;
                }
                Commands::Sentiment { chat } => {
                    commands::chat_sentiment(&settings, &chat).await?;
                }
                Commands::Summarize { inputs } => {
                    commands::summarize_files(&settings, &inputs).await?;
                }
                Commands::Actions { chat } => {
                    commands::chat_action_items(&settings, &chat).await?;
                }
                Commands::Ask { question, context } => {
                    commands::ask_question(&settings, &question, &context).await?;
                }
                Commands::Keys { json } => {
                    commands::show_keys(&settings, json).await?;
                }
                Commands::Config(config_cmd) => {
                    commands::config_command(&settings, config_cmd)?;
                }
                Commands::Completions { .. } => unreachable!(),
            }
        }
    }

    Ok(())
}

/// RUST_LOG wins over the configured level.
fn init_logging(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
