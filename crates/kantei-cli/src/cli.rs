//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use kantei_domain::{Domain, ScoreKind, TiePolicy};

/// Kantei CLI - Uncertainty-aware quality rankings for historical artisans.
#[derive(Debug, Parser)]
#[command(name = "kantei")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "KANTEI_CONFIG")]
    pub config: Option<String>,

    /// Database file path (overrides the configuration file)
    #[arg(long, global = true, env = "KANTEI_DB")]
    pub db: Option<String>,

    /// Engine preset (default, thorough, light)
    #[arg(long, global = true)]
    pub preset: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (codes and values only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import artisan counters and ownership from JSON
    Import(ImportArgs),

    /// Recompute derived scores
    Recompute(RecomputeArgs),

    /// Show an artisan's scores and standing in its domain
    Score(ScoreArgs),

    /// Rank a domain by one of the scores
    Rank(RankArgs),

    /// Resolve owner identities to prestige scores
    Tier(TierArgs),

    /// Run scheduled full recomputes until Ctrl+C
    Watch(WatchArgs),
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON file to import
    pub file: Option<String>,

    /// Read the JSON document from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Store the data without recomputing the imported artisans
    #[arg(long)]
    pub no_recompute: bool,
}

/// Arguments for the recompute command.
#[derive(Debug, Parser)]
pub struct RecomputeArgs {
    /// Recompute only these artisan codes
    #[arg(long = "code")]
    pub codes: Vec<String>,

    /// Restrict a full recompute to one domain
    #[arg(short, long, value_enum)]
    pub domain: Option<DomainArg>,

    /// Continue after the checkpoint of an interrupted run
    #[arg(long)]
    pub resume: bool,

    /// Compute and report without writing
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the score command.
#[derive(Debug, Parser)]
pub struct ScoreArgs {
    /// Artisan code
    pub code: String,

    /// Recompute the artisan before showing it
    #[arg(long)]
    pub refresh: bool,
}

/// Arguments for the rank command.
#[derive(Debug, Parser)]
pub struct RankArgs {
    /// Domain to rank
    #[arg(short, long, value_enum)]
    pub domain: DomainArg,

    /// Score to rank by
    #[arg(short, long, value_enum, default_value = "elite")]
    pub by: KindArg,

    /// Maximum number of rows
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// How tied scores are placed
    #[arg(long, value_enum, default_value = "strictly-below")]
    pub ties: TieArg,
}

/// Arguments for the tier command.
#[derive(Debug, Parser)]
pub struct TierArgs {
    /// Normalized owner identities
    #[arg(required = true)]
    pub owners: Vec<String>,
}

/// Arguments for the watch command.
#[derive(Debug, Parser)]
pub struct WatchArgs {
    /// Minutes between full recomputes (overrides the configuration)
    #[arg(short, long)]
    pub interval: Option<u64>,
}

/// Domain argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum DomainArg {
    /// Swordsmiths
    Smith,
    /// Sword-fitting makers
    FittingMaker,
}

/// Score kind argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    /// Elite factor
    Elite,
    /// Provenance factor
    Provenance,
}

/// Tie policy argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum TieArg {
    /// Share of the population strictly below
    StrictlyBelow,
    /// Average position of the tie group
    Fractional,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<DomainArg> for Domain {
    fn from(domain: DomainArg) -> Self {
        match domain {
            DomainArg::Smith => Domain::Smith,
            DomainArg::FittingMaker => Domain::FittingMaker,
        }
    }
}

impl From<KindArg> for ScoreKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Elite => ScoreKind::Elite,
            KindArg::Provenance => ScoreKind::Provenance,
        }
    }
}

impl From<TieArg> for TiePolicy {
    fn from(tie: TieArg) -> Self {
        match tie {
            TieArg::StrictlyBelow => TiePolicy::StrictlyBelow,
            TieArg::Fractional => TiePolicy::Fractional,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_command() {
        let cli = Cli::parse_from(["kantei", "rank", "--domain", "fitting-maker", "--by", "provenance"]);
        match cli.command {
            Command::Rank(args) => {
                assert_eq!(Domain::from(args.domain), Domain::FittingMaker);
                assert_eq!(ScoreKind::from(args.by), ScoreKind::Provenance);
                assert_eq!(TiePolicy::from(args.ties), TiePolicy::StrictlyBelow);
                assert!(args.limit.is_none());
            }
            _ => panic!("Expected Rank command"),
        }
    }

    #[test]
    fn test_recompute_codes() {
        let cli = Cli::parse_from(["kantei", "recompute", "--code", "MAS-001", "--code", "SAD-003"]);
        match cli.command {
            Command::Recompute(args) => {
                assert_eq!(args.codes, vec!["MAS-001", "SAD-003"]);
                assert!(!args.resume);
            }
            _ => panic!("Expected Recompute command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["kantei", "score", "MAS-001", "--format", "json", "--db", "x.db", "-v"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert_eq!(cli.db.as_deref(), Some("x.db"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_tier_requires_owner() {
        assert!(Cli::try_parse_from(["kantei", "tier"]).is_err());
    }
}
