use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::control_loop::{run_batch, unless_unavailable};
use cli::interactive::{Session, HELP};
use cli::relocate;
use cli::report::catalog_listing;
use sift_core::bootstrap::{build_controller, scan_options};
use sift_core::config::{self, AppConfig};
use sift_core::scanner::load_catalog;
use sift_core::Catalog;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::BufReader;
use tokio::runtime::Handle;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Filter {
            dir,
            phrase,
            recursive,
            json,
            move_dropped,
        } => run_filter(cfg, dir, phrase, recursive, json, move_dropped).await,
        Commands::List {
            dir,
            recursive,
            json,
        } => run_list(cfg, dir, recursive, json).await,
        Commands::Interactive { dir } => run_interactive(cfg, dir).await,
    }
}

#[derive(Parser)]
#[command(name = "image-sift")]
#[command(about = "Filter a directory of images with a vision model", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every image in a directory and drop those that do not match
    Filter {
        /// Directory to load
        dir: PathBuf,
        /// What the image should contain, e.g. "a cat"
        phrase: String,
        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
        /// Output JSON report
        #[arg(long)]
        json: bool,
        /// Move dropped files into this directory (default: leave files alone)
        #[arg(long)]
        move_dropped: Option<PathBuf>,
    },
    /// Show the catalog that a filter run would walk
    List {
        dir: PathBuf,
        #[arg(short, long)]
        recursive: bool,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Read commands from stdin while batches run
    Interactive {
        /// Directory to load at startup
        dir: Option<PathBuf>,
    },
}

async fn load(cfg: &AppConfig, dir: &Path, recursive: bool) -> Result<Catalog> {
    let mut options = scan_options(cfg);
    options.recursive |= recursive;
    load_catalog(dir, &options)
        .await
        .with_context(|| format!("loading {}", dir.display()))
}

async fn run_filter(
    cfg: AppConfig,
    dir: PathBuf,
    phrase: String,
    recursive: bool,
    json: bool,
    move_dropped: Option<PathBuf>,
) -> Result<()> {
    let catalog = load(&cfg, &dir, recursive).await?;
    let mut controller = build_controller(&cfg, catalog, Handle::current())?;
    let tick = Duration::from_millis(cfg.batch.tick_ms);
    let ctrl_c = unless_unavailable(tokio::signal::ctrl_c());

    let report = run_batch(&mut controller, &phrase, tick, ctrl_c).await?;

    if let Some(dest) = move_dropped {
        relocate::move_into(&report.dropped, &dest)?;
    }

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text());
    }
    report.ensure_not_aborted()
}

async fn run_list(cfg: AppConfig, dir: PathBuf, recursive: bool, json: bool) -> Result<()> {
    let catalog = load(&cfg, &dir, recursive).await?;
    if json {
        let rows: Vec<serde_json::Value> = catalog
            .items()
            .iter()
            .map(|item| {
                serde_json::json!({
                    "path": item.path,
                    "eligible": item.is_eligible(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", catalog_listing(&catalog));
    }
    Ok(())
}

async fn run_interactive(cfg: AppConfig, dir: Option<PathBuf>) -> Result<()> {
    let catalog = match &dir {
        Some(dir) => load(&cfg, dir, false).await?,
        None => Catalog::default(),
    };
    let controller = build_controller(&cfg, catalog, Handle::current())?;
    let tick = Duration::from_millis(cfg.batch.tick_ms);

    eprintln!("{HELP}");
    let mut session = Session::new(controller, scan_options(&cfg), tokio::io::stdout());
    session
        .run(BufReader::new(tokio::io::stdin()), tick)
        .await
}
