//! Watch command implementation.

use crate::cli::WatchArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kantei_engine::RecomputeWorker;
use std::time::Duration;

/// Execute the watch command.
pub async fn execute_watch(args: WatchArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut store = config.open_store()?;
    let mut worker = RecomputeWorker::new(config.engine.clone(), config.resolver()?)?;

    let minutes = args.interval.unwrap_or(config.engine.sweep_interval_minutes);
    if minutes == 0 {
        return Err(CliError::InvalidInput("--interval must be at least 1 minute".to_string()));
    }
    worker = worker.with_interval(Duration::from_secs(minutes * 60));

    println!(
        "{}",
        formatter.info(&format!("Recomputing every {} minute(s); press Ctrl+C to stop", minutes))
    );
    worker.run(&mut store).await?;

    println!("{}", formatter.success(&format!("Stopped after {} sweep(s)", worker.metrics().sweep_count)));
    Ok(())
}
