use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use depthview_config::Settings;
use depthview_core::{FrameQuery, FrameService};
use depthview_ingest::{ingest_path, IngestOptions, DEFAULT_ORIGINAL_WIDTH, DEFAULT_TARGET_WIDTH};
use depthview_store::{FrameStore, SqliteFrameStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "depthview")]
struct Cli {
    /// YAML settings file; environment variables still override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the frame table and depth index.
    InitDb,
    /// Load a CSV of scanlines into the store.
    Ingest {
        path: PathBuf,
        #[arg(long, default_value_t = DEFAULT_ORIGINAL_WIDTH)]
        original_width: usize,
        #[arg(long, default_value_t = DEFAULT_TARGET_WIDTH)]
        target_width: usize,
    },
    /// Print colormapped frames for a depth window as JSON.
    Query {
        #[arg(long)]
        depth_min: f64,
        #[arg(long)]
        depth_max: f64,
        #[arg(long, default_value = "viridis")]
        colormap: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::from_path(path)?,
        None => Settings::load()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::InitDb => {
            let store = open_store(&settings).await?;
            println!("frame table ready ({} rows)", store.count().await?);
        }
        Command::Ingest {
            path,
            original_width,
            target_width,
        } => {
            let store = open_store(&settings).await?;
            let opts = IngestOptions {
                original_width,
                target_width,
            };
            let report = ingest_path(&store, &path, opts).await?;
            println!(
                "ingested {}: {} inserted, {} already present",
                path.display(),
                report.inserted,
                report.skipped
            );
        }
        Command::Query {
            depth_min,
            depth_max,
            colormap,
        } => {
            // Validate before opening the database.
            let query = FrameQuery::parse(depth_min, depth_max, &colormap)?;
            let store: Arc<dyn FrameStore> = Arc::new(open_store(&settings).await?);
            let views = FrameService::new(store).retrieve(&query).await?;
            println!("{}", serde_json::to_string(&views)?);
        }
    }

    Ok(())
}

async fn open_store(settings: &Settings) -> anyhow::Result<SqliteFrameStore> {
    let store = SqliteFrameStore::connect(&settings.database_url, settings.max_connections).await?;
    store.init_schema().await?;
    Ok(store)
}
