use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Parser)]
#[command(name = "tab")]
#[command(about = "Drives a bounded, bidirectional conversation between coding-agent CLIs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run a conversation to completion from a TOML config")]
    Run {
        #[arg(long)]
        config: PathBuf,

        /// Override the config's participant order, e.g. --participants claude,codex
        #[arg(long, value_delimiter = ',')]
        participants: Option<Vec<String>>,

        /// Override the config's session topic.
        #[arg(long)]
        topic: Option<String>,

        /// Override the config's first speaker; must be one of the participants.
        #[arg(long)]
        initial_speaker: Option<String>,

        /// Write the full hash-chained audit trail to this path as JSONL.
        #[arg(long)]
        audit_export: Option<PathBuf>,
    },

    #[command(about = "Parse and validate a TOML config without running a conversation")]
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
}
