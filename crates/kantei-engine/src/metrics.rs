//! Metrics collection for recompute operations

use kantei_domain::Domain;
use std::collections::HashMap;

/// Metrics collected across recompute runs
///
/// Tracks artisans written and rejected per domain, plus run counts.
#[derive(Debug, Clone, Default)]
pub struct EngineMetrics {
    /// Artisans whose scores were written, per domain
    pub written: HashMap<Domain, usize>,

    /// Artisans rejected by an estimator, per domain
    pub rejected: HashMap<Domain, usize>,

    /// Full recomputes that ran to completion
    pub sweep_count: usize,

    /// Full recomputes stopped by cancellation
    pub interrupted_count: usize,

    /// Total runtime in milliseconds
    pub total_runtime_ms: u128,
}

impl EngineMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written artisan
    pub fn record_written(&mut self, domain: Domain) {
        *self.written.entry(domain).or_insert(0) += 1;
    }

    /// Record a rejected artisan
    pub fn record_rejected(&mut self, domain: Domain) {
        *self.rejected.entry(domain).or_insert(0) += 1;
    }

    /// Record a completed full recompute
    pub fn record_sweep(&mut self) {
        self.sweep_count += 1;
    }

    /// Record an interrupted full recompute
    pub fn record_interrupted(&mut self) {
        self.interrupted_count += 1;
    }

    /// Total written across all domains
    pub fn total_written(&self) -> usize {
        self.written.values().sum()
    }

    /// Total rejected across all domains
    pub fn total_rejected(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        self.written.clear();
        self.rejected.clear();
        self.sweep_count = 0;
        self.interrupted_count = 0;
        self.total_runtime_ms = 0;
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Recompute Metrics Summary".to_string(),
            "=========================".to_string(),
            format!("Completed sweeps: {}", self.sweep_count),
            format!("Interrupted sweeps: {}", self.interrupted_count),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            String::new(),
        ];

        for (label, counts, total) in [
            ("Written", &self.written, self.total_written()),
            ("Rejected", &self.rejected, self.total_rejected()),
        ] {
            if counts.is_empty() {
                continue;
            }
            lines.push(format!("{} by domain:", label));
            for domain in Domain::ALL {
                if let Some(count) = counts.get(&domain) {
                    lines.push(format!("  {}: {}", domain, count));
                }
            }
            lines.push(format!("  Total: {}", total));
            lines.push(String::new());
        }

        lines.join("\n").trim_end().to_string()
    }
}
