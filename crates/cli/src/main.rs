use anyhow::Result;
use clap::{Parser, Subcommand};
use mediacat::listing;
use mediacat_core::config;
use mediacat_core::config::AppConfig;
use mediacat_core::models::MediaType;
use mediacat_core::pipeline;
use mediacat_core::store::SqliteStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { json } => run_scan(cfg, json).await,
        Commands::List {
            media_type,
            host,
            json,
        } => run_list(cfg, media_type.as_deref(), host, json).await,
    }
}

#[derive(Parser)]
#[command(name = "mediacat")]
#[command(about = "Catalog local media files", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan media roots, classify new files and retire missing ones
    Scan {
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// List catalogued media
    List {
        /// Only this type (audio|tvshow|movie|video)
        #[arg(long = "type")]
        media_type: Option<String>,
        /// Host used in media URLs (defaults to server.host)
        #[arg(long)]
        host: Option<String>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

async fn run_scan(cfg: AppConfig, json: bool) -> Result<()> {
    if cfg.scan.roots.is_empty() {
        tracing::warn!("no media roots configured");
    }
    let summary = pipeline::run_scan(&cfg).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "scan: roots {} (skipped {}), files {}, new {}, classified {}, refreshed {}, failed {}, removed {}",
            summary.roots_scanned,
            summary.roots_skipped,
            summary.files_seen,
            summary.created,
            summary.classified,
            summary.refreshed,
            summary.failed,
            summary.swept
        );
    }
    Ok(())
}

async fn run_list(
    cfg: AppConfig,
    media_type: Option<&str>,
    host: Option<String>,
    json: bool,
) -> Result<()> {
    let media_type = media_type.map(str::parse::<MediaType>).transpose()?;
    let host = host.unwrap_or_else(|| cfg.server.host.clone());
    let store = SqliteStore::open(&cfg.database.path).await?;
    let views = listing::list_media(&store, media_type, &host).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        print!("{}", listing::render_table(&views));
    }
    Ok(())
}
