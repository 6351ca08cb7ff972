//! CLI surface for the retrieval-augmented QA engine.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::cli::output::OutputFormat;

/// Retrieval-augmented question answering over textbook content.
#[derive(Debug, Parser)]
#[command(name = "bookrag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check infrastructure status (embedding server, Qdrant)
    Status,

    /// Ingest textbook content from a sitemap or local markdown
    Ingest(commands::IngestArgs),

    /// Ask a question and get a context-grounded answer
    Ask(commands::AskArgs),

    /// Retrieve ranked chunks without answer synthesis
    Search(commands::SearchArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
