//! Ranking entry point
//!
//! Runs the whole pipeline for one graph snapshot:
//! connections -> ordered chain -> stationary distribution -> scores ->
//! decomposition. Every structure is built fresh per call.

use crate::attribution::{
    create_connections, create_ordered_sparse_markov_chain, distribution_to_node_distribution,
    find_stationary_distribution, ConvergenceReport, StationaryDistributionOptions,
};
use crate::decomposition::{decompose, PagerankNodeDecomposition};
use crate::graph::{Edge, EdgeAddress, Graph, NodeAddress};
use crate::score::{score_by_constant_total, NodeScore};
use crate::weights::EdgeWeight;
use credrank_common::config::RankConfig;
use credrank_common::errors::{RankError, Result};
use credrank_common::metrics::{self, RunOutcome};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;
use validator::Validate;

/// Ranking options
#[derive(Debug, Clone, Validate)]
pub struct PagerankOptions {
    /// Inbound weight of the synthetic self-loop on every node
    #[validate(range(min = 0.0))]
    pub self_loop_weight: f64,

    /// Stop once the max per-component delta is at most this
    #[validate(range(min = 0.0))]
    pub convergence_threshold: f64,

    /// Hard cap on power iterations
    pub max_iterations: usize,

    /// Scores of nodes under `total_score_node_prefix` sum to this
    #[validate(range(exclusive_min = 0.0))]
    pub total_score: f64,

    /// Normalization subset; the empty address matches every node
    pub total_score_node_prefix: NodeAddress,

    /// Log convergence diagnostics at info/warn level
    pub verbose: bool,

    /// Wall-clock budget between cooperative yields; `None` never yields
    pub yield_after: Option<Duration>,

    /// Record the run through the `metrics` facade
    pub record_metrics: bool,
}

impl Default for PagerankOptions {
    fn default() -> Self {
        Self {
            self_loop_weight: 1e-3,
            convergence_threshold: 1e-7,
            max_iterations: 255,
            total_score: 1000.0,
            total_score_node_prefix: NodeAddress::empty(),
            verbose: false,
            yield_after: Some(Duration::from_millis(30)),
            record_metrics: true,
        }
    }
}

impl PagerankOptions {
    /// Convert loaded configuration into validated options
    pub fn from_config(config: &RankConfig) -> Result<Self> {
        let metrics_enabled = config.observability.metrics_enabled;
        let config = &config.pagerank;
        let options = Self {
            self_loop_weight: config.self_loop_weight,
            convergence_threshold: config.convergence_threshold,
            max_iterations: config.max_iterations,
            total_score: config.total_score,
            total_score_node_prefix: NodeAddress::from_parts(&config.total_score_node_prefix)?,
            verbose: config.verbose,
            yield_after: config.yield_after(),
            record_metrics: metrics_enabled,
        };
        options.check()?;
        Ok(options)
    }

    /// Reject invalid values before any work is done
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| RankError::configuration(e.to_string()))?;

        let finite = [
            ("self_loop_weight", self.self_loop_weight),
            ("convergence_threshold", self.convergence_threshold),
            ("total_score", self.total_score),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(RankError::configuration(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }
        Ok(())
    }

    fn stationary_options(&self) -> StationaryDistributionOptions {
        StationaryDistributionOptions {
            convergence_threshold: self.convergence_threshold,
            max_iterations: self.max_iterations,
            yield_after: self.yield_after,
            verbose: self.verbose,
        }
    }
}

/// Everything a ranking run produces
#[derive(Debug, Clone, Serialize)]
pub struct PagerankResult {
    /// Per-node score breakdown
    pub pnd: PagerankNodeDecomposition,

    /// Normalized scores
    pub scores: NodeScore,

    /// The weight the evaluator assigned to each edge
    pub edge_weights: BTreeMap<EdgeAddress, EdgeWeight>,

    /// How the power iteration ended
    pub convergence: ConvergenceReport,
}

/// Rank every node of `graph`.
///
/// `edge_weight` is called once per edge. Fails without a partial result on
/// invalid options, negative weights or an empty normalization subset.
/// Reaching `max_iterations` is not a failure; see
/// `PagerankResult::convergence`.
pub async fn pagerank<G, F>(graph: &G, edge_weight: F, options: &PagerankOptions) -> Result<PagerankResult>
where
    G: Graph,
    F: FnMut(&Edge) -> EdgeWeight,
{
    run(graph, edge_weight, options, None).await
}

/// Like `pagerank`, but gives up with `RankError::Cancelled` once `cancel`
/// fires. The token is checked at each suspension point of the iteration.
pub async fn pagerank_cancellable<G, F>(
    graph: &G,
    edge_weight: F,
    options: &PagerankOptions,
    cancel: &CancellationToken,
) -> Result<PagerankResult>
where
    G: Graph,
    F: FnMut(&Edge) -> EdgeWeight,
{
    run(graph, edge_weight, options, Some(cancel)).await
}

async fn run<G, F>(
    graph: &G,
    edge_weight: F,
    options: &PagerankOptions,
    cancel: Option<&CancellationToken>,
) -> Result<PagerankResult>
where
    G: Graph,
    F: FnMut(&Edge) -> EdgeWeight,
{
    let start = Instant::now();
    let span = info_span!(
        "pagerank",
        run_id = %Uuid::new_v4(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
    );

    let result = rank(graph, edge_weight, options, cancel).instrument(span).await;

    let duration = start.elapsed().as_secs_f64();
    let (node_count, iterations, outcome) = match &result {
        Ok(ranked) if ranked.convergence.converged => {
            (ranked.scores.len(), ranked.convergence.iterations, RunOutcome::Converged)
        }
        Ok(ranked) => (ranked.scores.len(), ranked.convergence.iterations, RunOutcome::IterationCap),
        Err(e) => {
            tracing::warn!(error = %e, code = ?e.code(), "Ranking failed");
            (0, 0, RunOutcome::Failed)
        }
    };
    if options.record_metrics {
        metrics::record_run(duration, node_count, iterations, outcome);
    }
    result
}

async fn rank<G, F>(
    graph: &G,
    mut edge_weight: F,
    options: &PagerankOptions,
    cancel: Option<&CancellationToken>,
) -> Result<PagerankResult>
where
    G: Graph,
    F: FnMut(&Edge) -> EdgeWeight,
{
    options.check()?;

    let mut edge_weights = BTreeMap::new();
    let connections = create_connections(
        graph,
        |edge| {
            let weight = edge_weight(edge);
            edge_weights.insert(edge.address.clone(), weight);
            weight
        },
        options.self_loop_weight,
    )?;

    let osmc = create_ordered_sparse_markov_chain(&connections)?;
    let stationary =
        find_stationary_distribution(&osmc.chain, &options.stationary_options(), cancel).await?;

    let pi = distribution_to_node_distribution(&osmc.node_order, &stationary.pi)?;
    let scores = score_by_constant_total(&pi, options.total_score, &options.total_score_node_prefix)?;
    let pnd = decompose(&scores, &connections)?;

    if options.verbose {
        info!(
            iterations = stationary.report.iterations,
            converged = stationary.report.converged,
            "Ranking complete"
        );
    }

    Ok(PagerankResult {
        pnd,
        scores,
        edge_weights,
        convergence: stationary.report,
    })
}

impl PagerankResult {
    /// Render the result as pretty-printed JSON for reports
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
