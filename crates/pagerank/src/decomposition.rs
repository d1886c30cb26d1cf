//! Score decomposition
//!
//! Explains each node's score as the sum of what flows in along each of its
//! connections: the connection's probability times its source's score. At
//! the stationary distribution these contributions add up to the node's own
//! score.

use crate::attribution::{total_out_weights, Connection, Connections};
use crate::graph::NodeAddress;
use crate::score::NodeScore;
use credrank_common::errors::{RankError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// One connection's share of a node's score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredConnection {
    pub connection: Connection,
    pub source: NodeAddress,
    pub source_score: f64,
    pub score_contribution: f64,
}

/// A node's score and the connections it came from, largest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDecomposition {
    pub score: f64,
    pub scored_connections: Vec<ScoredConnection>,
}

pub type PagerankNodeDecomposition = BTreeMap<NodeAddress, NodeDecomposition>;

/// Attribute every node's score to its inbound connections
pub fn decompose(scores: &NodeScore, connections: &Connections) -> Result<PagerankNodeDecomposition> {
    let totals = total_out_weights(connections)?;
    let score_of = |address: &NodeAddress| {
        scores
            .get(address)
            .copied()
            .ok_or_else(|| RankError::structural(format!("no score for {}", address)))
    };

    let mut result = BTreeMap::new();
    for (target, target_connections) in connections {
        let mut scored_connections = Vec::with_capacity(target_connections.len());
        for connection in target_connections {
            let source = connection.adjacency.source();
            let source_score = score_of(source)?;
            let total = totals.get(source).copied().ok_or_else(|| {
                RankError::structural(format!("no outbound total for {}", source))
            })?;
            scored_connections.push(ScoredConnection {
                connection: connection.clone(),
                source: source.clone(),
                source_score,
                score_contribution: connection.weight / total * source_score,
            });
        }

        scored_connections.sort_by(|a, b| {
            b.score_contribution
                .total_cmp(&a.score_contribution)
                .then_with(|| a.source.cmp(&b.source))
        });

        result.insert(
            target.clone(),
            NodeDecomposition {
                score: score_of(target)?,
                scored_connections,
            },
        );
    }
    Ok(result)
}
