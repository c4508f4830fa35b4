//! Recompute command implementation.

use crate::cli::RecomputeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use kantei_engine::{Cancellable, CancellationToken, RecomputeReport, Recomputer};

/// Execute the recompute command.
///
/// With `--code`, only those artisans are recomputed. Otherwise every
/// artisan (optionally one domain) is, and Ctrl+C stops the run at the next
/// artisan boundary, leaving a checkpoint for `--resume`.
pub async fn execute_recompute(args: RecomputeArgs, config: &Config, formatter: &Formatter) -> Result<RecomputeReport> {
    let mut engine = config.engine.clone();
    engine.dry_run |= args.dry_run;

    let mut store = config.open_store()?;
    let mut recomputer = Recomputer::new(engine, config.resolver()?)?;

    let report = if !args.codes.is_empty() {
        recomputer.recompute_codes(&mut store, &args.codes)?
    } else {
        let token = CancellationToken::new();
        let watcher = {
            let token = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, stopping after the current artisan");
                    token.cancel();
                }
            })
        };

        let result = recomputer.recompute_all(&mut store, args.domain.map(Into::into), args.resume, &token);
        watcher.abort();
        result?
    };

    println!("{}", formatter.format_report(&report)?);
    tracing::debug!("{}", recomputer.metrics().summary());
    Ok(report)
}
