use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::{OutputFormat, get_formatter};
use crate::models::Config;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Initialize configuration file with defaults")]
    Init {
        #[arg(long, short = 'f', help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Show configuration file path")]
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    match cmd {
        ConfigCommand::Init { force } => handle_init(force, format),
        ConfigCommand::Show => handle_show(format),
        ConfigCommand::Path => handle_path(),
    }
}

fn handle_init(force: bool, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let path = Config::config_path()
        .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;

    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    Config::default().save().context("failed to write config")?;
    println!(
        "{}",
        formatter.format_message(&format!("Created config at: {}", path.display()))
    );

    Ok(())
}

fn handle_show(format: OutputFormat) -> Result<()> {
    let mut config = Config::load()?;

    // Keys come from the environment; never echo them back
    config.embedding.api_key = None;
    config.vector_store.api_key = None;
    config.synthesis.api_key = None;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Text => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn handle_path() -> Result<()> {
    let path = Config::config_path()
        .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
    println!("{}", path.display());
    Ok(())
}
