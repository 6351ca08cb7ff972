use anyhow::Result;
use clap::Args;
use std::time::Instant;

use crate::cli::commands::{build_retriever, resolve_language};
use crate::cli::output::{OutputFormat, get_formatter};
use crate::models::{Config, SearchResults};
use crate::utils::validation::{validate_query, validate_selected_text};

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(
        long,
        short = 's',
        help = "Search within this passage instead of the indexed corpus"
    )]
    pub selected_text: Option<String>,

    #[arg(long, short = 'l', help = "Language partition to search (e.g., 'en')")]
    pub language: Option<String>,

    #[arg(long, short = 'k', help = "Maximum number of results to return")]
    pub top_k: Option<usize>,
}

pub async fn handle_search(args: SearchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let query = validate_query(&args.query).map_err(|e| anyhow::anyhow!("{e}"))?;
    let selected = args
        .selected_text
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    if let Some(text) = selected {
        validate_selected_text(text).map_err(|e| anyhow::anyhow!("{e}"))?;
    }

    let language = resolve_language(&config, args.language.as_deref())?;

    if let Some(top_k) = args.top_k
        && top_k == 0
    {
        anyhow::bail!("top_k must be at least 1");
    }

    if verbose {
        eprintln!("Query: \"{}\"", query);
        eprintln!("  Language: {}", language);
        eprintln!("  Top-k: {}", args.top_k.unwrap_or(config.retrieval.top_k));
    }

    let retriever = build_retriever(&config)?;
    let outcome = retriever
        .retrieve(query, selected, &language, args.top_k)
        .await;

    let duration_ms = start_time.elapsed().as_millis() as u64;
    let results = SearchResults::new(query.to_string(), outcome.mode, outcome.results, duration_ms);

    print!("{}", formatter.format_search_results(&results));

    Ok(())
}
