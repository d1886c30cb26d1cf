//! Stationary distribution by bounded power iteration
//!
//! The iteration is async only so that it can hand control back to the
//! scheduler: after every `yield_after` of wall-clock work it awaits
//! `tokio::task::yield_now` and resumes with the same state. The numeric
//! trace never depends on when those suspensions happen.

use super::chain::{
    check_structure, compute_delta, sparse_markov_chain_action, uniform_distribution, Distribution,
    SparseRow,
};
use credrank_common::errors::{RankError, Result};
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Power iteration options
#[derive(Debug, Clone)]
pub struct StationaryDistributionOptions {
    /// Stop once the max per-component delta is at most this
    pub convergence_threshold: f64,

    /// Hard cap on iterations
    pub max_iterations: usize,

    /// Wall-clock budget between yields; `None` never yields
    pub yield_after: Option<Duration>,

    /// Log every iteration's delta at info level, and the outcome at
    /// info/warn instead of debug
    pub verbose: bool,
}

impl Default for StationaryDistributionOptions {
    fn default() -> Self {
        Self {
            convergence_threshold: 1e-7,
            max_iterations: 255,
            yield_after: Some(Duration::from_millis(30)),
            verbose: false,
        }
    }
}

/// How the iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConvergenceReport {
    /// Iterations performed
    pub iterations: usize,

    /// Whether the threshold was reached before the iteration cap
    pub converged: bool,

    /// Delta of the last iteration, `None` if no iteration ran
    pub delta: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct StationaryDistribution {
    pub pi: Distribution,
    pub report: ConvergenceReport,
}

/// Approximate the stationary distribution of `chain`, starting from the
/// uniform distribution.
///
/// Hitting `max_iterations` is not an error: the last iterate is returned
/// with `converged = false`. `cancel` is checked at every suspension point,
/// or every iteration when yielding is disabled.
pub async fn find_stationary_distribution(
    chain: &[SparseRow],
    options: &StationaryDistributionOptions,
    cancel: Option<&CancellationToken>,
) -> Result<StationaryDistribution> {
    check_structure(chain)?;

    let mut pi = uniform_distribution(chain.len());
    let mut delta = None;
    let mut iterations = 0;
    let mut last_yield = Instant::now();

    loop {
        if iterations >= options.max_iterations {
            if options.verbose {
                warn!(iterations, delta = ?delta, "Stationary distribution did not converge");
            } else {
                debug!(iterations, delta = ?delta, "Stationary distribution did not converge");
            }
            return Ok(StationaryDistribution {
                pi,
                report: ConvergenceReport {
                    iterations,
                    converged: false,
                    delta,
                },
            });
        }

        let next = sparse_markov_chain_action(chain, &pi);
        let step_delta = compute_delta(&pi, &next);
        pi = next;
        iterations += 1;
        delta = Some(step_delta);

        if options.verbose {
            info!(iteration = iterations, delta = step_delta, "Power iteration progress");
        }

        if step_delta <= options.convergence_threshold {
            if options.verbose {
                info!(iterations, delta = step_delta, "Stationary distribution converged");
            } else {
                debug!(iterations, delta = step_delta, "Stationary distribution converged");
            }
            return Ok(StationaryDistribution {
                pi,
                report: ConvergenceReport {
                    iterations,
                    converged: true,
                    delta,
                },
            });
        }

        match options.yield_after {
            Some(budget) => {
                if last_yield.elapsed() >= budget {
                    debug!(iterations, delta = step_delta, "Yielding power iteration");
                    tokio::task::yield_now().await;
                    check_cancelled(cancel, iterations)?;
                    last_yield = Instant::now();
                }
            }
            None => check_cancelled(cancel, iterations)?,
        }
    }
}

fn check_cancelled(cancel: Option<&CancellationToken>, iterations: usize) -> Result<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(RankError::Cancelled { iterations }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::chain::sparse_markov_chain_from_transition_matrix;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    fn options(max_iterations: usize) -> StationaryDistributionOptions {
        StationaryDistributionOptions {
            max_iterations,
            yield_after: None,
            ..Default::default()
        }
    }

    /// State 0 leaks half its mass to the absorbing state 1 each step
    fn leaky_chain() -> Vec<SparseRow> {
        sparse_markov_chain_from_transition_matrix(&[vec![0.5, 0.5], vec![0.0, 1.0]]).unwrap()
    }

    #[tokio::test]
    async fn test_single_node() {
        let chain = sparse_markov_chain_from_transition_matrix(&[vec![1.0]]).unwrap();
        let result = find_stationary_distribution(&chain, &options(255), None).await.unwrap();
        assert_eq!(result.pi, vec![1.0]);
        assert!(result.report.converged);
        assert_eq!(result.report.iterations, 1);
    }

    #[tokio::test]
    async fn test_converges_to_absorbing_state() {
        let result = find_stationary_distribution(&leaky_chain(), &options(255), None).await.unwrap();
        assert!(result.report.converged);
        assert!(result.report.delta.unwrap() <= 1e-7);
        assert!(result.pi[0] < 1e-6);
        assert!((result.pi[1] - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_iteration_cap_returns_last_iterate() {
        let result = find_stationary_distribution(&leaky_chain(), &options(3), None).await.unwrap();
        assert!(!result.report.converged);
        assert_eq!(result.report.iterations, 3);
        assert_eq!(result.pi, vec![0.0625, 0.9375]);
    }

    #[tokio::test]
    async fn test_zero_iterations_returns_uniform() {
        let result = find_stationary_distribution(&leaky_chain(), &options(0), None).await.unwrap();
        assert_eq!(result.pi, vec![0.5, 0.5]);
        assert_eq!(result.report.iterations, 0);
        assert_eq!(result.report.delta, None);
        assert!(!result.report.converged);
    }

    #[tokio::test]
    async fn test_empty_chain() {
        let result = find_stationary_distribution(&[], &options(10), None).await.unwrap();
        assert!(result.pi.is_empty());
        assert!(result.report.converged);
    }

    #[test]
    fn test_yielding_does_not_change_result() {
        let chain = leaky_chain();
        let eager = tokio_test::block_on(find_stationary_distribution(&chain, &options(255), None)).unwrap();

        let always_yield = StationaryDistributionOptions {
            yield_after: Some(Duration::ZERO),
            ..options(255)
        };
        let yielding = tokio_test::block_on(find_stationary_distribution(&chain, &always_yield, None)).unwrap();

        assert_eq!(eager.pi, yielding.pi);
        assert_eq!(eager.report, yielding.report);
    }

    #[tokio::test]
    async fn test_cancellation_at_suspension_point() {
        let token = CancellationToken::new();
        token.cancel();
        let always_yield = StationaryDistributionOptions {
            yield_after: Some(Duration::ZERO),
            ..options(255)
        };
        let err = find_stationary_distribution(&leaky_chain(), &always_yield, Some(&token))
            .await
            .unwrap_err();
        assert!(matches!(err, RankError::Cancelled { iterations: 1 }));
    }

    #[tokio::test]
    async fn test_uncancelled_token_is_ignored() {
        let token = CancellationToken::new();
        let result = find_stationary_distribution(&leaky_chain(), &options(255), Some(&token))
            .await
            .unwrap();
        assert!(result.report.converged);
    }

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn run_logged(options: &StationaryDistributionOptions) -> (StationaryDistribution, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let chain = leaky_chain();
        let result = tracing::subscriber::with_default(subscriber, || {
            tokio_test::block_on(find_stationary_distribution(&chain, options, None))
        })
        .unwrap();
        (result, logs.contents())
    }

    #[test]
    fn test_verbose_logs_progress_and_convergence_warning() {
        let verbose = StationaryDistributionOptions {
            verbose: true,
            ..options(3)
        };
        let (result, logs) = run_logged(&verbose);

        assert!(!result.report.converged);
        assert_eq!(logs.matches("Power iteration progress").count(), 3);
        let warning = logs
            .lines()
            .find(|line| line.contains("did not converge"))
            .unwrap();
        assert!(warning.contains("WARN"));
        assert!(warning.contains("iterations=3"));
    }

    #[test]
    fn test_quiet_run_logs_outcome_at_debug_only() {
        let (result, logs) = run_logged(&options(3));

        assert!(!result.report.converged);
        assert!(!logs.contains("Power iteration progress"));
        let outcome = logs
            .lines()
            .find(|line| line.contains("did not converge"))
            .unwrap();
        assert!(outcome.contains("DEBUG"));
    }

    #[test]
    fn test_verbose_reports_convergence_at_info() {
        let verbose = StationaryDistributionOptions {
            verbose: true,
            ..options(255)
        };
        let (result, logs) = run_logged(&verbose);

        assert!(result.report.converged);
        let line = logs.lines().find(|line| line.contains("converged")).unwrap();
        assert!(line.contains("INFO"));
        assert_eq!(
            logs.matches("Power iteration progress").count(),
            result.report.iterations
        );
    }

    #[tokio::test]
    async fn test_malformed_chain_is_structural_error() {
        let mut row = SparseRow::default();
        row.push(5, 1.0);
        let err = find_stationary_distribution(&[row], &options(10), None).await.unwrap_err();
        assert!(err.is_internal());
    }
}
