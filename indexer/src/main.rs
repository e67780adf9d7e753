use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use docsearch_core::{CacheStatus, EngineConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, inspect and query cached inverted indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct IndexArgs {
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
}

impl IndexArgs {
    fn config(self) -> EngineConfig {
        let mut config = EngineConfig::new(&self.source);
        if let Some(methods) = self.methods {
            config.methods = methods;
        }
        config.encoding = self.encoding;
        config.cache_dir = self.cache_dir;
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index, or load it if this configuration is already cached
    Build {
        #[command(flatten)]
        index: IndexArgs,
        /// Rebuild and overwrite an existing cache entry
        #[arg(long, default_value_t = false)]
        rebuild: bool,
    },
    /// Print the cache key for a configuration without touching the corpus
    Key {
        #[command(flatten)]
        index: IndexArgs,
    },
    /// Run one query and print the matches
    Search {
        #[command(flatten)]
        index: IndexArgs,
        /// Free-text query
        query: String,
        /// Print ordinals only
        #[arg(long, default_value_t = false)]
        indices: bool,
    },
    /// Print index statistics as JSON
    Stats {
        #[command(flatten)]
        index: IndexArgs,
    },
}

/// Exit status for a failed command: 2 for a bad method or encoding name, like
/// other usage errors, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<docsearch_core::Error>() {
        Some(e) if e.is_config_error() => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_code(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build { index, rebuild } => {
            let opened = index.config().open(rebuild)?;
            let verb = match opened.status {
                CacheStatus::Built => "built",
                CacheStatus::Loaded => "loaded",
            };
            println!("{verb} {}", opened.cache_key);
        }
        Commands::Key { index } => {
            println!("{}", index.config().cache_key()?);
        }
        Commands::Search { index, query, indices } => {
            let opened = index.config().open(false)?;
            let hits = opened.engine.search(&query)?;
            tracing::info!(query = %query, hits = hits.len(), "search complete");
            for hit in hits {
                if indices {
                    println!("{}", hit.doc_id);
                } else {
                    println!("{}\t{}", hit.doc_id, hit.text);
                }
            }
        }
        Commands::Stats { index } => {
            let opened = index.config().open(false)?;
            let stats = opened.engine.index().stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
