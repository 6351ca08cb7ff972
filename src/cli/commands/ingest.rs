//! Ingest command implementation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::commands::{build_chunker, build_embedder, build_index, resolve_language};
use crate::cli::output::{OutputFormat, get_formatter};
use crate::error::ConfigError;
use crate::models::Config;
use crate::services::{Embedder, IngestStats, IngestionPipeline, VectorIndex};
use crate::sources::{LocalSource, SitemapSource};

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(long, help = "Sitemap URL to discover textbook pages from")]
    pub sitemap: Option<String>,

    #[arg(long, help = "Local markdown directory or file to ingest")]
    pub dir: Option<PathBuf>,

    #[arg(long, short = 'l', help = "Language partition to ingest into (e.g., 'en')")]
    pub language: Option<String>,

    #[arg(long, help = "Re-ingest even if the collection already has points")]
    pub force: bool,

    #[arg(long, help = "Limit the number of pages processed")]
    pub max_pages: Option<usize>,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let language = resolve_language(&config, args.language.as_deref())?;

    let sitemap_url = args
        .sitemap
        .clone()
        .or_else(|| config.ingestion.sitemap_url.clone());
    if args.dir.is_some() && args.sitemap.is_some() {
        anyhow::bail!("pass either --sitemap or --dir, not both");
    }
    if args.dir.is_none() && sitemap_url.is_none() {
        anyhow::bail!(
            "no ingestion source: pass --sitemap or --dir, or set ingestion.sitemap_url in the config"
        );
    }

    let embedder = build_embedder(&config)?;
    let index = build_index(&config)?;

    // A dimension mismatch between embedder and index is a fatal
    // configuration error; catch it before any data moves.
    let actual = embedder
        .probe_dimension()
        .await
        .context("embedding server probe failed")?;
    if actual != config.embedding.dimension {
        return Err(ConfigError::DimensionMismatch {
            expected: config.embedding.dimension,
            actual,
        }
        .into());
    }

    index
        .ensure_collection(&language)
        .await
        .context("failed to create collection")?;

    if !args.force {
        let info = index.collection_info(&language).await?;
        if let Some(info) = info
            && info.points_count > 0
        {
            anyhow::bail!(
                "collection for '{}' already contains {} points; use --force to re-ingest",
                language,
                info.points_count
            );
        }
    }

    let mut stats = IngestStats::default();
    let embedder_dyn: Arc<dyn Embedder> = embedder;
    let index_dyn: Arc<dyn VectorIndex> = index;
    let mut pipeline = IngestionPipeline::new(
        embedder_dyn,
        index_dyn,
        build_chunker(&config)?,
        language.clone(),
        config.ingestion.flush_threshold,
    );

    if let Some(dir) = args.dir {
        let source = LocalSource::new(dir, &config.ingestion, language.clone());
        let mut documents = source.collect()?;
        if let Some(max) = args.max_pages {
            documents.truncate(max);
        }
        if documents.is_empty() {
            println!("{}", formatter.format_message("No documents found to ingest."));
            return Ok(());
        }
        stats.pages_discovered = documents.len() as u64;

        let pb = progress_bar(documents.len() as u64);
        for document in &documents {
            pb.inc(1);
            match pipeline.add_document(document).await {
                Ok(created) => {
                    stats.pages_processed += 1;
                    stats.chunks_created += created as u64;
                }
                Err(e) => {
                    stats.pages_skipped += 1;
                    if verbose {
                        pb.println(format!("Skipping {}: {}", document.source, e));
                    }
                }
            }
        }
        pipeline.finish().await?;
        pb.finish_and_clear();
    } else if let Some(sitemap_url) = sitemap_url {
        let source = SitemapSource::new(&config.ingestion, language.clone())?;
        let mut urls = source.discover(&sitemap_url).await?;
        if let Some(max) = args.max_pages {
            urls.truncate(max);
        }
        if urls.is_empty() {
            println!("{}", formatter.format_message("No pages found in sitemap."));
            return Ok(());
        }
        stats.pages_discovered = urls.len() as u64;

        let pb = progress_bar(urls.len() as u64);
        for url in &urls {
            pb.inc(1);

            let document = match source.fetch_page(url).await {
                Ok(doc) => doc,
                Err(e) => {
                    stats.pages_skipped += 1;
                    tracing::warn!(url = %url, error = %e, "skipping page");
                    if verbose {
                        pb.println(format!("Skipping {}: {}", url, e));
                    }
                    continue;
                }
            };

            if document.content.is_empty() {
                stats.pages_skipped += 1;
                continue;
            }

            let created = pipeline.add_document(&document).await?;
            stats.pages_processed += 1;
            stats.chunks_created += created as u64;
        }
        pipeline.finish().await?;
        pb.finish_and_clear();
    }

    stats.duration_ms = start_time.elapsed().as_millis() as u64;
    tracing::info!(
        pages = stats.pages_processed,
        chunks = stats.chunks_created,
        "ingestion completed"
    );
    print!("{}", formatter.format_ingest_stats(&stats));

    Ok(())
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}
