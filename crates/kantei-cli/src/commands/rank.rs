//! Rank command implementation.

use crate::cli::RankArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kantei_domain::{PercentileService, ScoreKind};

/// Execute the rank command.
pub fn execute_rank(args: RankArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    if args.limit == Some(0) {
        return Err(CliError::InvalidInput("--limit must be at least 1".to_string()));
    }

    let store = config.open_store()?;
    let service = PercentileService::new(args.ties.into());
    let kind: ScoreKind = args.by.into();

    let snapshot = kantei_engine::rank_domain(&store, &service, args.domain.into(), kind)?;

    println!("{}", formatter.format_ranking(&snapshot, kind, args.limit)?);
    Ok(())
}
