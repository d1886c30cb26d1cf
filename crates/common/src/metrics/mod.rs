//! Metrics and observability utilities
//!
//! Records ranking runs through the `metrics` facade. No exporter is
//! bundled; without an installed recorder every call is a no-op.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// Metrics prefix for all CredRank metrics
pub const METRICS_PREFIX: &str = "credrank";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_runs_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of ranking runs, labelled by outcome"
    );

    describe_histogram!(
        format!("{}_run_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Ranking run latency in seconds"
    );

    describe_histogram!(
        format!("{}_iterations", METRICS_PREFIX),
        Unit::Count,
        "Power iterations performed per run"
    );

    describe_gauge!(
        format!("{}_graph_nodes", METRICS_PREFIX),
        Unit::Count,
        "Number of nodes in the most recently ranked graph"
    );

    tracing::debug!("Metrics registered");
}

/// Outcome label for a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Converged,
    IterationCap,
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Converged => "converged",
            RunOutcome::IterationCap => "iteration_cap",
            RunOutcome::Failed => "failed",
        }
    }
}

/// Helper to record a finished ranking run
pub fn record_run(duration_secs: f64, node_count: usize, iterations: usize, outcome: RunOutcome) {
    counter!(
        format!("{}_runs_total", METRICS_PREFIX),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(format!("{}_run_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    if outcome != RunOutcome::Failed {
        histogram!(format!("{}_iterations", METRICS_PREFIX)).record(iterations as f64);
        gauge!(format!("{}_graph_nodes", METRICS_PREFIX)).set(node_count as f64);
    }
}
