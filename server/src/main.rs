use anyhow::Result;
use axum::Router;
use clap::Parser;
use docsearch_core::EngineConfig;
use server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus path: a JSON/JSONL file, a directory of them, or a SQLite database
    #[arg(short = 'p', long)]
    source: PathBuf,
    /// Preprocessing methods, applied in order (comma-separated; pass no value to disable)
    #[arg(short, long, num_args = 0.., value_delimiter = ',')]
    methods: Option<Vec<String>>,
    /// Posting list encoding: gamma or delta
    #[arg(short, long)]
    encoding: Option<String>,
    /// Directory holding cached indexes
    #[arg(long, default_value = "./data/index")]
    cache_dir: PathBuf,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let mut config = EngineConfig::new(&args.source);
    if let Some(methods) = args.methods {
        config.methods = methods;
    }
    config.encoding = args.encoding;
    config.cache_dir = args.cache_dir;
    let app: Router = build_app(&config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
