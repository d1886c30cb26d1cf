//! Score normalization
//!
//! Rescales a probability distribution into scores. The scale factor may be
//! derived from a subset of nodes, but every node receives a score.

use crate::attribution::NodeDistribution;
use crate::graph::NodeAddress;
use credrank_common::errors::{RankError, Result};
use std::collections::BTreeMap;

/// Score per node address
pub type NodeScore = BTreeMap<NodeAddress, f64>;

/// Scale `pi` so that the scores of nodes matching `prefix` sum to
/// `total_score`. Nodes outside the prefix are scaled by the same factor.
pub fn score_by_constant_total(
    pi: &NodeDistribution,
    total_score: f64,
    prefix: &NodeAddress,
) -> Result<NodeScore> {
    if !(total_score.is_finite() && total_score > 0.0) {
        return Err(RankError::configuration(format!(
            "total_score must be positive, got {}",
            total_score
        )));
    }

    let matching_mass: f64 = pi
        .iter()
        .filter(|(address, _)| address.has_prefix(prefix))
        .map(|(_, probability)| probability)
        .sum();

    if matching_mass == 0.0 {
        return Err(RankError::normalization(format!(
            "no probability mass under prefix {}",
            prefix
        )));
    }

    Ok(scale(pi, total_score / matching_mass))
}

/// Scale `pi` so that the most probable node scores exactly `max_score`
pub fn score_by_maximum_probability(pi: &NodeDistribution, max_score: f64) -> Result<NodeScore> {
    if !(max_score.is_finite() && max_score > 0.0) {
        return Err(RankError::configuration(format!(
            "max_score must be positive, got {}",
            max_score
        )));
    }

    let max_probability = pi.values().copied().fold(0.0, f64::max);
    if max_probability == 0.0 {
        return Err(RankError::normalization("distribution has no positive entry"));
    }

    Ok(scale(pi, max_score / max_probability))
}

fn scale(pi: &NodeDistribution, factor: f64) -> NodeScore {
    pi.iter()
        .map(|(address, probability)| (address.clone(), probability * factor))
        .collect()
}
