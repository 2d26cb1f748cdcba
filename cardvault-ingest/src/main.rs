//! cardvault-ingest - Catalog synchronization command
//!
//! Streams one catalog document into the card database, creating, updating
//! and deleting only what changed since the previous import. Prints the
//! import report as JSON on success.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use cardvault_common::config::{resolve_root_folder, TomlConfig};
use cardvault_ingest::ImportCoordinator;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for cardvault-ingest
#[derive(Parser, Debug)]
#[command(name = "cardvault-ingest")]
#[command(about = "Synchronize a card catalog document into the cardvault database")]
#[command(version)]
struct Args {
    /// Catalog document (JSON)
    file: PathBuf,

    /// Root folder holding the database
    #[arg(short, long, env = "CARDVAULT_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Database file (overrides `<root>/cardvault.db`)
    #[arg(short, long, env = "CARDVAULT_DATABASE")]
    database: Option<PathBuf>,

    /// Concurrent card reconciliation workers
    #[arg(short, long, env = "CARDVAULT_WORKERS")]
    workers: Option<usize>,

    /// TOML config file
    #[arg(short, long, env = "CARDVAULT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config decides the default log level, so load it under a temporary subscriber
    let config = tracing::subscriber::with_default(tracing_subscriber::fmt().finish(), || {
        TomlConfig::load_or_default(args.config.as_deref())
    });

    init_tracing(&config)?;

    info!("Starting cardvault-ingest {}", env!("CARGO_PKG_VERSION"));

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = args
        .database
        .clone()
        .unwrap_or_else(|| config.database_path(&root_folder));
    info!("Root folder: {}", root_folder.display());
    info!("Database: {}", db_path.display());

    let mut settings = config.import.clone();
    if let Some(workers) = args.workers {
        settings.workers = workers;
    }

    let pool = cardvault_common::db::init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let input = File::open(&args.file)
        .with_context(|| format!("Failed to open catalog {}", args.file.display()))?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let coordinator = ImportCoordinator::new(pool.clone(), settings);
    let report = coordinator
        .run(input, cancel)
        .await
        .with_context(|| format!("Import of {} failed", args.file.display()))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize import report")?
    );

    pool.close().await;
    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level applies to both workspace crates
fn init_tracing(config: &TomlConfig) -> Result<()> {
    let level = &config.logging.level;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("cardvault_ingest={level},cardvault_common={level}").into()
    });

    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

/// Cancel the import on Ctrl+C or SIGTERM; running card tasks still finish
async fn cancel_on_shutdown(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, cancelling import");
        },
        _ = terminate => {
            info!("Received terminate signal, cancelling import");
        },
    }

    cancel.cancel();
}
