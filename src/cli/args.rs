//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// insights - AI-powered meeting, chat and whiteboard insights
#[derive(Parser, Debug)]
#[command(name = "insights")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Describe a whiteboard image (PNG)
    Describe {
        /// Path to the image
        image: PathBuf,

        /// Custom instructions instead of the default description prompt
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Regularise a freehand shape given as JSON
    #[command(alias = "regularize")]
    Regularise {
        /// Path to the shape JSON
        shape: PathBuf,
    },

    /// Sentiment time series for a chat transcript (JSON)
    Sentiment {
        /// Path to the chat JSON
        chat: PathBuf,
    },

    /// Summarise one or more files into a rolling summary
    #[command(alias = "summarise")]
    Summarize {
        /// Files to fold into the summary, in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Extract action items from a chat transcript (JSON)
    Actions {
        /// Path to the chat JSON
        chat: PathBuf,
    },

    /// Ask a question, optionally against summarised context files
    Ask {
        /// The question
        question: String,

        /// Files summarised into the context before answering
        #[arg(short, long)]
        context: Vec<PathBuf>,
    },

    /// Show the API key pool status
    Keys {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
