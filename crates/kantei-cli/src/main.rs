//! Kantei CLI - rank historical artisans by uncertainty-aware quality scores.

use clap::Parser;
use kantei_cli::commands;
use kantei_cli::{Cli, Command, Config, Formatter};
use kantei_engine::EngineConfig;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Exit status when a recompute left artisans unwritten.
const EXIT_REJECTED: i32 = 2;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> kantei_cli::Result<i32> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    let default_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_str())),
        )
        .init();

    // Load config
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Command-line overrides
    if let Some(db) = cli.db {
        config.database = db.into();
    }
    if let Some(preset) = &cli.preset {
        config.engine = EngineConfig::preset(preset)?;
    }

    // Determine output format
    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    // Handle commands
    let rejected = match cli.command {
        Command::Import(args) => commands::execute_import(args, &config, &formatter)?
            .map(|report| !report.rejected.is_empty())
            .unwrap_or(false),
        Command::Recompute(args) => !commands::execute_recompute(args, &config, &formatter)
            .await?
            .rejected
            .is_empty(),
        Command::Score(args) => {
            commands::execute_score(args, &config, &formatter)?;
            false
        }
        Command::Rank(args) => {
            commands::execute_rank(args, &config, &formatter)?;
            false
        }
        Command::Tier(args) => {
            commands::execute_tier(args, &config, &formatter)?;
            false
        }
        Command::Watch(args) => {
            commands::execute_watch(args, &config, &formatter).await?;
            false
        }
    };

    Ok(if rejected { EXIT_REJECTED } else { 0 })
}
