//! Builds the vector index from a directory of PDFs.
//!
//! With no arguments this reads `./data` and writes `./vectorstore/db_faiss`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use quickmcq::{PdfLoader, RagConfig, SemanticEmbedder, build_index, init_tracing};

#[derive(Parser, Debug)]
#[command(
    name = "ingest",
    about = "Split PDFs into chunks, embed them and persist the vector index"
)]
struct IngestCli {
    /// YAML pipeline configuration
    #[arg(long, env = "QUICKMCQ_CONFIG")]
    config: Option<PathBuf>,

    /// Directory scanned recursively for *.pdf files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory the index is written to (replaced atomically)
    #[arg(long)]
    index_path: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = IngestCli::parse();

    let mut cfg = RagConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        cfg.paths.data_dir = dir;
    }
    if let Some(dir) = cli.index_path {
        cfg.paths.index_path = dir;
    }
    init_tracing(&cfg.logging)
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialise logging")?;

    let embedder = SemanticEmbedder::new(cfg.semantic.clone()).context("invalid embedding config")?;
    let report = build_index(&cfg, &PdfLoader, &embedder)
        .await
        .with_context(|| format!("ingestion from {} failed", cfg.paths.data_dir.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "Indexed {} chunks from {} pages in {} files ({}-dim, model {}) into {} in {:.2?}.",
        report.chunks,
        report.pages,
        report.files,
        report.dimension,
        report.model_id,
        report.index_path.display(),
        report.elapsed
    );
    Ok(())
}
