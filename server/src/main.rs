//! Recall Server Entry Point
//!
//! Serves Model Context Protocol over stdio. With `--index-only` it runs a
//! single ingestion pass over the source directory and exits.

use clap::Parser;
use recall_memory::config::{DEFAULT_EMBED_MODEL, DEFAULT_EMBED_URL};
use recall_memory::{ChunkingConfig, EmbeddingConfig, HttpEmbedder, IndexConfig, VectorEngine};
use recall_server::{BackendConfig, McpBackend, McpServer, ServerResult};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "recall-server")]
#[command(about = "Document search and agent memory over MCP")]
#[command(version)]
struct Args {
    /// Folder of documents to index
    #[arg(long, default_value = "documents")]
    source_dir: PathBuf,

    /// Folder for the index, metadata and fingerprint cache
    #[arg(long, default_value = "faiss_index")]
    storage_dir: PathBuf,

    /// Embedding endpoint
    #[arg(long, default_value = DEFAULT_EMBED_URL)]
    embed_url: String,

    /// Embedding model; must not change for the life of an index
    #[arg(long, default_value = DEFAULT_EMBED_MODEL)]
    embed_model: String,

    /// Per-request embedding timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    embed_timeout_ms: u64,

    /// Words per chunk
    #[arg(long, default_value_t = 180)]
    chunk_size: usize,

    /// Words shared by consecutive chunks
    #[arg(long, default_value_t = 40)]
    chunk_overlap: usize,

    /// Descend into subdirectories of the source folder
    #[arg(long)]
    recursive: bool,

    /// Results returned by search_documents
    #[arg(long, default_value_t = 3)]
    top_k: usize,

    /// Index the source folder and exit
    #[arg(long)]
    index_only: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recall_server=info,recall_memory=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("Recall server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> ServerResult<()> {
    let embedding = EmbeddingConfig {
        url: args.embed_url,
        model: args.embed_model,
        timeout_ms: args.embed_timeout_ms,
    };
    let chunking = ChunkingConfig::new(args.chunk_size, args.chunk_overlap)?;
    let index = IndexConfig::new(args.source_dir, args.storage_dir)
        .with_chunking(chunking)
        .recursive(args.recursive);

    tracing::info!("Embedding with {} via {}", embedding.model, embedding.url);
    tracing::info!("Source: {:?}, storage: {:?}", index.source_dir, index.storage_dir);

    let provider = HttpEmbedder::new(&embedding)?;
    let engine = Arc::new(VectorEngine::new(Arc::new(provider)));
    let backend = McpBackend::new(
        engine,
        BackendConfig {
            index,
            top_k: args.top_k,
        },
    )?;

    if args.index_only {
        let report = backend.index_documents().await?;
        tracing::info!(
            "Processed {} documents ({} chunks), skipped {}, failed {}",
            report.processed,
            report.chunks_added,
            report.skipped,
            report.failed.len()
        );
        return Ok(());
    }

    tracing::info!("Starting recall MCP server");
    let mut server = McpServer::new(backend);
    server.run().await?;
    Ok(())
}
