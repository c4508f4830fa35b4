//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use kantei_domain::prestige::{Resolution, ResolutionSource};
use kantei_domain::{ArtisanRecord, Grade, PercentileSnapshot, RankedArtisan, ScoreKind};
use kantei_engine::{RecomputeReport, RecomputeStatus};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format one artisan with its standing in both rankings.
    pub fn format_artisan(
        &self,
        record: &ArtisanRecord,
        elite: Option<&RankedArtisan>,
        provenance: Option<&RankedArtisan>,
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let summary = record.provenance.as_ref();
                let value = serde_json::json!({
                    "code": record.code,
                    "domain": record.domain.as_str(),
                    "elite_count": record.elite_count,
                    "total_count": record.total_count,
                    "elite_factor": record.elite_factor,
                    "provenance_factor": record.provenance_factor(),
                    "observations": summary.map(|s| s.n),
                    "mean_prestige": summary.and_then(|s| s.empirical_mean()),
                    "apex": summary.and_then(|s| s.apex),
                    "elite_standing": elite.map(standing_json),
                    "provenance_standing": provenance.map(standing_json),
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(format!(
                "{}\t{}\t{}",
                record.code,
                optional(record.elite_factor, 4),
                optional(record.provenance_factor(), 2)
            )),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                builder.push_record(["Code".to_string(), record.code.clone()]);
                builder.push_record(["Domain".to_string(), record.domain.to_string()]);
                builder.push_record([
                    "Elite works".to_string(),
                    format!("{} / {}", record.elite_count, record.total_count),
                ]);
                builder.push_record(["Elite factor".to_string(), optional(record.elite_factor, 4)]);
                builder.push_record(["Elite standing".to_string(), self.standing(elite)]);

                let (observations, mean, apex) = match &record.provenance {
                    Some(summary) => (
                        summary.n.to_string(),
                        optional(summary.empirical_mean(), 2),
                        optional(summary.apex, 1),
                    ),
                    None => ("-".to_string(), "-".to_string(), "-".to_string()),
                };
                builder.push_record(["Owner observations".to_string(), observations]);
                builder.push_record(["Mean owner prestige".to_string(), mean]);
                builder.push_record(["Apex owner prestige".to_string(), apex]);
                builder.push_record(["Provenance factor".to_string(), optional(record.provenance_factor(), 2)]);
                builder.push_record(["Provenance standing".to_string(), self.standing(provenance)]);

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));

                let mut out = table.to_string();
                if record.elite_factor.is_none() {
                    out.push('\n');
                    out.push_str(&self.warning("Scores not computed yet; run 'kantei recompute'"));
                }
                Ok(out)
            }
        }
    }

    /// Format a domain ranking.
    pub fn format_ranking(&self, snapshot: &PercentileSnapshot, kind: ScoreKind, limit: Option<usize>) -> Result<String> {
        let shown = &snapshot.entries()[..limit.unwrap_or(usize::MAX).min(snapshot.len())];
        let decimals = match kind {
            ScoreKind::Elite => 4,
            ScoreKind::Provenance => 2,
        };

        match self.format {
            OutputFormat::Json => {
                let rows: Vec<serde_json::Value> = shown
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "code": e.code,
                            "score": e.score,
                            "percentile": e.percentile,
                            "rank": e.rank,
                            "grade": e.grade.as_str(),
                        })
                    })
                    .collect();
                let value = serde_json::json!({
                    "domain": snapshot.domain().as_str(),
                    "by": kind.as_str(),
                    "population": snapshot.len(),
                    "entries": rows,
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(shown.iter().map(|e| e.code.as_str()).collect::<Vec<_>>().join("\n")),
            OutputFormat::Table => {
                if shown.is_empty() {
                    return Ok(self.colorize(&format!("No {} scores in {}.", kind, snapshot.domain()), "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Rank", "Code", "Score", "Percentile", "Grade"]);
                for entry in shown {
                    builder.push_record([
                        entry.rank.to_string(),
                        entry.code.clone(),
                        format!("{:.*}", decimals, entry.score),
                        format!("{:.1}", entry.percentile),
                        self.grade(entry.grade),
                    ]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));

                Ok(format!(
                    "{}\n{}",
                    self.info(&format!(
                        "{} by {} ({} of {} artisans)",
                        snapshot.domain(),
                        kind,
                        shown.len(),
                        snapshot.len()
                    )),
                    table
                ))
            }
        }
    }

    /// Format owner resolutions.
    pub fn format_resolutions(&self, resolutions: &[(String, Resolution)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let rows: Vec<serde_json::Value> = resolutions
                    .iter()
                    .map(|(owner, r)| {
                        serde_json::json!({
                            "owner": owner,
                            "score": r.score,
                            "source": source_label(&r.source),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&rows)?)
            }
            OutputFormat::Quiet => Ok(resolutions
                .iter()
                .map(|(_, r)| r.score.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Owner", "Prestige", "Source"]);
                for (owner, r) in resolutions {
                    builder.push_record([owner.clone(), format!("{:.1}", r.score), source_label(&r.source)]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a recompute report.
    pub fn format_report(&self, report: &RecomputeReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let rejected: Vec<serde_json::Value> = report
                    .rejected
                    .iter()
                    .map(|r| serde_json::json!({ "code": r.code, "error": r.error.to_string() }))
                    .collect();
                let (status, last_code) = match &report.status {
                    RecomputeStatus::Completed => ("completed", None),
                    RecomputeStatus::Interrupted { last_code } => ("interrupted", last_code.clone()),
                };
                let value = serde_json::json!({
                    "status": status,
                    "last_code": last_code,
                    "written": report.written,
                    "rejected": rejected,
                    "missing": report.missing,
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Quiet => Ok(report
                .rejected
                .iter()
                .map(|r| r.code.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut lines = Vec::new();
                match &report.status {
                    RecomputeStatus::Completed => {
                        lines.push(self.success(&format!("Recomputed {} artisan(s)", report.written)));
                    }
                    RecomputeStatus::Interrupted { last_code } => {
                        lines.push(self.warning(&format!(
                            "Interrupted after {} artisan(s); resume with --resume (last: {})",
                            report.written,
                            last_code.as_deref().unwrap_or("-")
                        )));
                    }
                }
                for code in &report.missing {
                    lines.push(self.warning(&format!("Not found: {}", code)));
                }
                for rejected in &report.rejected {
                    lines.push(self.error(&format!("Rejected: {}", rejected.error)));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format import result.
    pub fn import_result(&self, count: usize) -> String {
        self.success(&format!("Imported {} artisan(s)", count))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn standing(&self, ranked: Option<&RankedArtisan>) -> String {
        match ranked {
            Some(r) => format!("#{} · {:.1}th percentile · {}", r.rank, r.percentile, self.grade(r.grade)),
            None => "-".to_string(),
        }
    }

    fn grade(&self, grade: Grade) -> String {
        let color = match grade {
            Grade::S => "magenta",
            Grade::A => "green",
            Grade::B => "cyan",
            Grade::C => "yellow",
            Grade::D => "red",
        };
        self.colorize(grade.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn optional(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "-".to_string())
}

fn standing_json(ranked: &RankedArtisan) -> serde_json::Value {
    serde_json::json!({
        "rank": ranked.rank,
        "percentile": ranked.percentile,
        "grade": ranked.grade.as_str(),
    })
}

fn source_label(source: &ResolutionSource) -> String {
    match source {
        ResolutionSource::Override => "override".to_string(),
        ResolutionSource::Group(tier) => tier.as_str().to_string(),
        ResolutionSource::Default => "default".to_string(),
    }
}
