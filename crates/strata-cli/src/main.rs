//! Strata CLI - fragment extraction and schema drift tracking.

mod cli;
mod commands;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Commands};
use strata::{Strata, StrataConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime.block_on(run(cli)),
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so `--json` output on stdout stays parseable.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn open(
    data_dir: &Path,
    config: Option<&Path>,
) -> Result<Strata, Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => StrataConfig::load(path)?,
        None => StrataConfig::default(),
    };
    tracing::debug!(data_dir = %data_dir.display(), "opening store");
    Ok(Strata::open(data_dir, config).await?)
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Extract { file, json } => commands::extract::run(file, json, cli.verbose),
        Commands::Diff { old, new, json } => commands::diff::run(old, new, json),
        command => {
            let strata = open(&cli.data_dir, cli.config.as_deref()).await?;
            dispatch(&strata, command).await
        }
    }
}

/// Run a command that reads or writes the store.
async fn dispatch(strata: &Strata, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Ingest {
            file,
            source,
            content_type,
            json,
        } => commands::ingest::run(strata, file, source, content_type, json).await,

        Commands::Infer { source, json } => commands::infer::run(strata, &source, json).await,

        Commands::Latest { source, json } => {
            commands::versions::latest(strata, &source, json).await
        }

        Commands::Versions { source, json } => {
            commands::versions::list(strata, &source, json).await
        }

        Commands::Compare {
            source,
            v1,
            v2,
            json,
        } => commands::compare::run(strata, &source, v1, v2, json).await,

        Commands::Files {
            limit,
            offset,
            json,
        } => commands::files::files(strata, limit, offset, json).await,

        Commands::Fragments {
            file_id,
            kind,
            json,
        } => commands::files::fragments(strata, &file_id, kind, json).await,

        Commands::Sources { json } => commands::files::sources(strata, json).await,

        Commands::Extract { .. } | Commands::Diff { .. } => Ok(()),
    }
}
