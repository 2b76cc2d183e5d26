// ABOUTME: CLI entry point for the LibertySoil to FreeFeed migrator
// ABOUTME: Parses global options and commands, then runs them behind a spinner

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use ls_ff_migrator::commands;
use ls_ff_migrator::config::{CliOverrides, MigratorConfig};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ls-ff-migrator", version)]
#[command(about = "Dump LibertySoil tables to JSON and import them into FreeFeed", long_about = None)]
struct Cli {
    /// Directory containing dump files (users.json, comments.json, etc.)
    #[arg(short = 'd', long, global = true)]
    dump_dir: Option<PathBuf>,

    /// LibertySoil connection string
    #[arg(long, global = true)]
    ls_conn: Option<String>,

    /// FreeFeed connection string
    #[arg(long, global = true)]
    ff_conn: Option<String>,

    /// Rows fetched per page while dumping
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// TOML file with defaults for the options above
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dumps libertysoil tables to json files
    #[command(name = "dump-ls-db")]
    DumpLsDb,
    /// Import specified freefeed tables from libertysoil dumps
    Import {
        /// Tables to import (default: users posts comments subscriptions likes)
        tables: Vec<String>,
    },
}

/// Run `command` with a spinner titled `title`, marking it done or failed
async fn with_spinner<T, F>(title: &str, command: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message(title.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = command.await;
    match &result {
        Ok(_) => spinner.finish_with_message(format!("{} - Done", title)),
        Err(_) => spinner.abandon_with_message(format!("{} - Failed", title)),
    }

    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = MigratorConfig::resolve(
        CliOverrides {
            dump_dir: cli.dump_dir,
            ls_conn: cli.ls_conn,
            ff_conn: cli.ff_conn,
            batch_size: cli.batch_size,
        },
        cli.config.as_deref(),
    )?;

    match cli.command {
        Commands::DumpLsDb => {
            with_spinner("Dumping LibertySoil database", commands::dump_ls_db(&config)).await?;
        }
        Commands::Import { tables } => {
            with_spinner(
                "Importing FreeFeed tables",
                commands::import(&config, tables.as_slice()),
            )
            .await?;
        }
    }

    Ok(())
}
