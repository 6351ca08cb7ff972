use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::commands::{build_retriever, resolve_language};
use crate::cli::output::{OutputFormat, get_formatter};
use crate::error::QueryError;
use crate::models::{Config, QueryRequest};
use crate::services::{AnswerGenerator, AnswerPipeline, ChatCompletionsClient};

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, help = "Question to answer from the textbook")]
    pub query: String,

    #[arg(
        long,
        short = 's',
        help = "Restrict retrieval to this passage instead of the indexed corpus"
    )]
    pub selected_text: Option<String>,

    #[arg(long, short = 'l', help = "Language partition to search (e.g., 'en')")]
    pub language: Option<String>,

    #[arg(long, short = 'k', help = "Number of chunks to retrieve")]
    pub top_k: Option<usize>,

    #[arg(long, help = "Session identifier carried into the response")]
    pub session: Option<String>,
}

pub async fn handle_ask(args: AskArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let language = resolve_language(&config, args.language.as_deref())?;

    let retriever = build_retriever(&config)?;
    let generator: Arc<dyn AnswerGenerator> = Arc::new(
        ChatCompletionsClient::new(&config.synthesis)
            .context("failed to create generation client")?,
    );
    let pipeline = AnswerPipeline::new(
        retriever,
        generator,
        config.retrieval.max_context_chunks,
        language.clone(),
    );

    if verbose {
        eprintln!("Query: \"{}\"", args.query.trim());
        eprintln!("  Language: {}", language);
        if let Some(ref text) = args.selected_text {
            eprintln!("  Selected text: {} chars", text.chars().count());
        }
    }

    let mut request = QueryRequest::new(args.query).with_language(language);
    request.selected_text = args.selected_text;
    request.top_k = args.top_k;
    request.session_id = args.session;

    let outcome = match pipeline.answer(&request).await {
        Ok(outcome) => outcome,
        Err(QueryError::InvalidInput(reason)) => {
            anyhow::bail!("{}", formatter.format_error(&reason));
        }
        Err(e) => return Err(e).context("query failed"),
    };

    print!("{}", formatter.format_answer(&outcome));

    Ok(())
}
