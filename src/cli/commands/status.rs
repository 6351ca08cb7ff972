use anyhow::Result;

use crate::cli::commands::{build_embedder, build_index};
use crate::cli::output::{OutputFormat, StatusInfo, get_formatter};
use crate::models::Config;
use crate::services::VectorIndex;

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let embedder = build_embedder(&config)?;
    let (embedding_healthy, embedding_model) = match embedder.health_check().await {
        Ok(health) => (true, health.model_id),
        Err(_) => (false, None),
    };

    let index = build_index(&config)?;
    let vector_store_connected = index.health_check().await.unwrap_or(false);

    let mut collections = Vec::new();
    for language in &config.vector_store.languages {
        let name = index.collection_name(language);
        let points = if vector_store_connected {
            index
                .collection_info(language)
                .await
                .ok()
                .flatten()
                .map(|info| info.points_count)
        } else {
            None
        };
        collections.push((name, points));
    }

    let status = StatusInfo {
        embedding_url: config.embedding.url.clone(),
        embedding_healthy,
        embedding_model,
        embedding_dimension: config.embedding.dimension,
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected,
        collections,
    };

    print!("{}", formatter.format_status(&status));

    if !embedding_healthy || !vector_store_connected {
        eprintln!();
        if !embedding_healthy {
            eprintln!(
                "Warning: embedding server unreachable at {}",
                config.embedding.url
            );
        }
        if !vector_store_connected {
            eprintln!("Warning: Qdrant not running. Start with: docker compose up -d qdrant");
        }
    }

    Ok(())
}
