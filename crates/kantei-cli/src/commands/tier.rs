//! Tier command implementation.

use crate::cli::TierArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the tier command.
pub fn execute_tier(args: TierArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let resolver = config.resolver()?;

    let resolutions: Vec<_> = args
        .owners
        .into_iter()
        .map(|owner| {
            let resolution = resolver.explain(&owner);
            (owner, resolution)
        })
        .collect();

    println!("{}", formatter.format_resolutions(&resolutions)?);
    Ok(())
}
