//! fsync CLI - directory watcher feeding an undoable command pipeline
//!
//! This binary wires the recursive watcher to the command manager and runs
//! until Ctrl-C.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fsync_command::{Command, CommandManager};
use fsync_core::config::{Config, LogFormat, LoggingConfig};
use fsync_watcher::{RecursiveWatcher, WatcherConfig};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Parser)]
#[command(name = "fsync")]
#[command(about = "Watch a directory tree and queue an undoable command per change")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Watch the sync root until interrupted (default)
    Watch,
    /// Print the resolved configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())
        .with_context(|| config_source(cli.config.as_deref()))?;

    init_logging(&config.logging, cli.verbose)?;

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => watch(config).await,
        Commands::Config => print_config(&config),
    }
}

fn config_source(path: Option<&Path>) -> String {
    match path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    }
}

/// Build the filter directive for our crates at `level`
fn log_directive(level: &str) -> String {
    ["fsync", "fsync_core", "fsync_watcher", "fsync_command"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize logging system
///
/// `RUST_LOG` wins over the configured level; `--verbose` forces debug.
/// Logs go to stderr and, when configured, to an appended log file.
fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { config.level.as_str() };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_directive(level)));

    let mut layers = vec![format_layer(config.format, std::io::stderr, true)];
    if let Some(file) = config.open_file()? {
        layers.push(format_layer(config.format, Mutex::new(file), false));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .init();

    Ok(())
}

/// Build a fmt layer writing to `writer` in the configured format
fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);
    match format {
        LogFormat::Console => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

fn print_config(config: &Config) -> Result<()> {
    let rendered = config.to_toml_string()?;
    println!("{rendered}");
    Ok(())
}

/// Watch the sync root and feed every change to the command manager
async fn watch(config: Config) -> Result<()> {
    config.validate()?;
    let root = config.validate_root()?.to_path_buf();

    info!(
        root = %root.display(),
        capacity = config.queue.capacity,
        workers = config.queue.workers,
        history_limit = ?config.history.limit,
        "Starting sync client"
    );

    let manager: Arc<CommandManager> = Arc::new(CommandManager::from_config(&config)?);
    let mut watcher = RecursiveWatcher::new(WatcherConfig::from(&config.watcher))?;
    let shutdown = watcher.shutdown_handle();

    let producer = Arc::clone(&manager);
    let mut watch_task = tokio::task::spawn_blocking(move || {
        watcher.watch(&root, |event| {
            if let Some(command) = Command::from_event(&event) {
                producer.add_command(command);
            }
        })
    });

    let watch_result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
                Err(e) => error!("Error setting up signal handler: {e}"),
            }
            shutdown.shutdown();
            watch_task.await
        }
        result = &mut watch_task => {
            warn!("Watcher exited before shutdown was requested");
            result
        }
    };

    manager.stop().await;

    let stats = manager.stats();
    info!(
        admitted = stats.admitted,
        dropped = stats.dropped,
        executed = stats.executed,
        failed = stats.failed,
        history = manager.history_len(),
        "Sync client shut down"
    );

    watch_result.context("Watcher task panicked")??;
    Ok(())
}
