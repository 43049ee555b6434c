//! Index command handler.
//!
//! Builds and inspects the SQLite vector index.

use clap::{Args, Subcommand};
use kbhub_core::{config::AppConfig, AppResult};
use kbhub_knowledge::{build_index, create_provider, index_stats, EmbeddingConfig};
use std::path::PathBuf;

/// Build or inspect the vector index
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Embed the dataset and write the index
    Build(IndexBuildCommand),
    /// Show index statistics
    Stats(IndexStatsCommand),
}

/// Embed the dataset and write the index
#[derive(Args, Debug)]
pub struct IndexBuildCommand {
    /// Dataset CSV (default: configured dataset path)
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Index directory (default: configured index path)
    #[arg(long)]
    pub index: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexBuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let dataset = self.dataset.clone().unwrap_or_else(|| config.dataset_file());
        let index_dir = self.index.clone().unwrap_or_else(|| config.index_dir());
        tracing::info!("Building index at {:?} from {:?}", index_dir, dataset);

        let embedding = EmbeddingConfig::from_app_config(config);
        let provider = create_provider(&embedding)?;

        let stats = build_index(&dataset, &index_dir, provider.as_ref(), embedding.batch_size).await?;

        if self.json {
            let output = serde_json::json!({
                "documents": stats.documents,
                "dimensions": stats.dimensions,
                "indexFile": stats.index_file,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} documents ({} dimensions) in {:.2}s",
                stats.documents, stats.dimensions, stats.duration_secs
            );
            println!("Index: {}", stats.index_file.display());
        }

        Ok(())
    }
}

/// Show index statistics
#[derive(Args, Debug)]
pub struct IndexStatsCommand {
    /// Index directory (default: configured index path)
    #[arg(long)]
    pub index: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexStatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let index_dir = self.index.clone().unwrap_or_else(|| config.index_dir());
        let stats = index_stats(&index_dir)?;

        if self.json {
            let output = serde_json::json!({
                "indexFile": stats.index_file,
                "documents": stats.documents,
                "provider": stats.meta.provider,
                "model": stats.meta.model,
                "dimensions": stats.meta.dimensions,
                "builtAt": stats.meta.built_at,
                "dbSizeBytes": stats.db_size_bytes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Index: {}", stats.index_file.display());
            println!("  Documents: {}", stats.documents);
            println!(
                "  Embeddings: {} / {} ({} dimensions)",
                stats.meta.provider, stats.meta.model, stats.meta.dimensions
            );
            println!("  Built: {}", stats.meta.built_at);
            println!("  DB size: {} bytes", stats.db_size_bytes);
        }

        Ok(())
    }
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            IndexAction::Build(cmd) => cmd.execute(config).await,
            IndexAction::Stats(cmd) => cmd.execute(config),
        }
    }
}
