//! Score command implementation.

use crate::cli::ScoreArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kantei_domain::traits::ArtisanStore;
use kantei_domain::{PercentileService, ScoreKind};
use kantei_engine::{rank_domain, Recomputer};

/// Execute the score command.
pub fn execute_score(args: ScoreArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut store = config.open_store()?;

    if args.refresh {
        let mut recomputer = Recomputer::new(config.engine.clone(), config.resolver()?)?;
        recomputer.recompute_one(&mut store, &args.code)?;
    }

    let record = store
        .get_artisan(&args.code)?
        .ok_or_else(|| CliError::NotFound(args.code.clone()))?;

    let service = PercentileService::default();
    let elite = rank_domain(&store, &service, record.domain, ScoreKind::Elite)?;
    let provenance = rank_domain(&store, &service, record.domain, ScoreKind::Provenance)?;

    println!(
        "{}",
        formatter.format_artisan(&record, elite.get(&record.code), provenance.get(&record.code))?
    );
    Ok(())
}
