//! Larder storage CLI
//!
//! Opens the storage layer from command-line arguments and environment
//! variables, then runs one maintenance command against the active backend.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use larder_persistence::config::StorageConfig;
use larder_persistence::repository::Repositories;
use larder_persistence::types::{Backup, RestoreMode};

/// Maintenance commands for the Larder storage layer.
#[derive(Debug, Parser)]
#[command(name = "larder", version, about)]
struct Cli {
    #[command(flatten)]
    storage: StorageConfig,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "LARDER_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Connects to every configured backend and reports its health.
    Check,

    /// Writes a backup of the active backend as JSON.
    Export {
        /// Output file; defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Restores a JSON backup into the active backend.
    Restore {
        /// Backup file written by `export`.
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = RestoreMode::Merge)]
        mode: RestoreMode,
    },

    /// Prints expired and soon-to-expire items as JSON.
    Expiring {
        /// Days ahead of today that count as near expiry.
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

/// Initializes the tracing subscriber. Logs go to stderr so command output
/// on stdout stays machine-readable.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("larder={level},larder_persistence={level}")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn write_json<T: serde::Serialize>(value: &T, output: Option<&PathBuf>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

async fn run(repos: &Repositories, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Check => {
            repos.health_check().await?;
            let backends: Vec<&str> = repos.backends().iter().map(|b| b.name()).collect();
            info!(active = %repos.active_kind(), ?backends, "storage healthy");
            println!("ok ({})", repos.active_kind());
        }
        Command::Export { output } => {
            let backup = repos.backup().await?;
            write_json(&backup, output.as_ref())?;
            info!(
                items = backup.items.len(),
                types = backup.types.len(),
                locations = backup.locations.len(),
                "backup written"
            );
        }
        Command::Restore { input, mode } => {
            let file = File::open(&input)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            let backup: Backup = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("{} is not a valid backup", input.display()))?;
            let report = repos.restore(&backup, mode).await?;
            write_json(&report, None)?;
        }
        Command::Expiring { days } => {
            let report = repos.items().get_expiring(days).await?;
            write_json(&report, None)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(errors) = cli.storage.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        backend = %cli.storage.initial_backend(),
        cache = %cli.storage.cache_url,
        "Opening storage"
    );

    let repos = Repositories::open(&cli.storage)
        .await
        .context("Failed to open storage")?;

    let result = run(&repos, cli.command).await;
    repos.shutdown().await?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use larder_persistence::core::{BackendKind, BackendSelector};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_restore_arguments() {
        let cli = Cli::try_parse_from(["larder", "restore", "backup.json", "--mode", "replace"]).unwrap();
        match cli.command {
            Command::Restore { input, mode } => {
                assert_eq!(input, PathBuf::from("backup.json"));
                assert_eq!(mode, RestoreMode::Replace);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_storage_flags_flatten() {
        let cli = Cli::try_parse_from([
            "larder",
            "--db-type",
            "relational",
            "--database-url",
            ":memory:",
            "expiring",
            "--days",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.storage.database_url, ":memory:");
        assert!(matches!(cli.command, Command::Expiring { days: 7 }));
    }

    #[tokio::test]
    async fn test_export_then_restore_round_trip() {
        let config = StorageConfig {
            db_type: "relational".to_string(),
            database_url: ":memory:".to_string(),
            ..Default::default()
        };
        let selector = BackendSelector::fixed(BackendKind::Relational);
        let repos = Repositories::open_with_selector(&config, selector).await.unwrap();
        repos.types().insert("Tools").await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        run(&repos, Command::Export { output: Some(path.clone()) }).await.unwrap();
        repos.types().delete("Tools").await.unwrap();
        run(&repos, Command::Restore { input: path, mode: RestoreMode::Merge }).await.unwrap();

        assert!(repos.types().find_by_name("Tools").await.unwrap().is_some());
    }
}
