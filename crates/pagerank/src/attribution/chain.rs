//! Ordered sparse Markov chains
//!
//! Nodes get a dense index from a total order over their addresses, and every
//! hot-path vector is a plain `Vec` indexed by it. Chains are stored by
//! inflow: row `i` lists `(source index, probability)` pairs for the mass
//! arriving at node `i`. Each source's outgoing probabilities, gathered
//! across all rows, sum to 1.

use super::connections::{total_out_weights, Connections};
use crate::graph::NodeAddress;
use credrank_common::errors::{RankError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Tolerance for stochasticity checks
pub const STOCHASTIC_TOLERANCE: f64 = 1e-6;

/// Inbound probabilities of one node, as parallel arrays
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SparseRow {
    pub neighbor: Vec<usize>,
    pub weight: Vec<f64>,
}

impl SparseRow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            neighbor: Vec::with_capacity(capacity),
            weight: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, neighbor: usize, weight: f64) {
        self.neighbor.push(neighbor);
        self.weight.push(weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.neighbor.iter().copied().zip(self.weight.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.neighbor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbor.is_empty()
    }
}

pub type SparseMarkovChain = Vec<SparseRow>;

/// Dense probability vector, parallel to a node order
pub type Distribution = Vec<f64>;

/// Probability per node address
pub type NodeDistribution = BTreeMap<NodeAddress, f64>;

/// A sparse chain together with the node order that indexes it
#[derive(Debug, Clone, Serialize)]
pub struct OrderedSparseMarkovChain {
    pub node_order: Vec<NodeAddress>,
    pub chain: SparseMarkovChain,
}

/// Convert connections into an ordered sparse chain.
///
/// The node order is the address order, so it is identical for every
/// snapshot with the same node set.
pub fn create_ordered_sparse_markov_chain(
    connections: &Connections,
) -> Result<OrderedSparseMarkovChain> {
    let node_order: Vec<NodeAddress> = connections.keys().cloned().collect();
    let totals = total_out_weights(connections)?;

    let mut chain = Vec::with_capacity(node_order.len());
    for target_connections in connections.values() {
        let mut row = SparseRow::with_capacity(target_connections.len());
        for connection in target_connections {
            let source = connection.adjacency.source();
            let index = index_of(&node_order, source)?;
            let total = totals.get(source).copied().ok_or_else(|| {
                RankError::structural(format!("no outbound total for {}", source))
            })?;
            row.push(index, connection.weight / total);
        }
        chain.push(row);
    }

    validate_chain(&chain)?;
    Ok(OrderedSparseMarkovChain { node_order, chain })
}

fn index_of(node_order: &[NodeAddress], address: &NodeAddress) -> Result<usize> {
    node_order
        .binary_search(address)
        .map_err(|_| RankError::structural(format!("{} is missing from the node order", address)))
}

/// Check that `chain` is a well-formed stochastic chain: every row
/// nonempty, every index in range, every probability finite and
/// nonnegative, and every source's outgoing probabilities summing to 1.
pub fn validate_chain(chain: &[SparseRow]) -> Result<()> {
    check_structure(chain)?;
    if let Some(index) = chain.iter().position(SparseRow::is_empty) {
        return Err(RankError::structural(format!("row {} is empty", index)));
    }

    let mut outflow = vec![0.0; chain.len()];
    for row in chain {
        for (source, probability) in row.iter() {
            outflow[source] += probability;
        }
    }
    for (source, total) in outflow.iter().enumerate() {
        if (total - 1.0).abs() > STOCHASTIC_TOLERANCE {
            return Err(RankError::structural(format!(
                "outgoing probabilities of node {} sum to {}",
                source, total
            )));
        }
    }
    Ok(())
}

/// Structural checks shared by every consumer of a chain
pub(crate) fn check_structure(chain: &[SparseRow]) -> Result<()> {
    let n = chain.len();
    for (index, row) in chain.iter().enumerate() {
        if row.neighbor.len() != row.weight.len() {
            return Err(RankError::structural(format!(
                "row {} has {} neighbors but {} weights",
                index,
                row.neighbor.len(),
                row.weight.len()
            )));
        }
        for (source, probability) in row.iter() {
            if source >= n {
                return Err(RankError::structural(format!(
                    "row {} references index {} in a chain of {} nodes",
                    index, source, n
                )));
            }
            if !probability.is_finite() || probability < 0.0 {
                return Err(RankError::structural(format!(
                    "row {} has invalid probability {}",
                    index, probability
                )));
            }
        }
    }
    Ok(())
}

/// Build an inflow chain from a dense transition matrix, where
/// `matrix[i][j]` is the probability of moving from `i` to `j`.
pub fn sparse_markov_chain_from_transition_matrix(matrix: &[Vec<f64>]) -> Result<SparseMarkovChain> {
    let n = matrix.len();
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != n {
            return Err(RankError::configuration(format!(
                "expected rows to have length {}, but row {} has {}",
                n,
                i,
                row.len()
            )));
        }
        if let Some(value) = row.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(RankError::configuration(format!(
                "row {}: invalid probability {}",
                i, value
            )));
        }
        let sum: f64 = row.iter().sum();
        if (sum - 1.0).abs() > STOCHASTIC_TOLERANCE {
            return Err(RankError::configuration(format!("row {}: bad sum {}", i, sum)));
        }
    }

    let chain = (0..n)
        .map(|target| {
            let mut row = SparseRow::default();
            for (source, source_row) in matrix.iter().enumerate() {
                let weight = source_row[target];
                if weight != 0.0 {
                    row.push(source, weight);
                }
            }
            row
        })
        .collect();
    Ok(chain)
}

/// `1/n` everywhere
pub fn uniform_distribution(n: usize) -> Distribution {
    vec![1.0 / n as f64; n]
}

/// One step of the chain: `out[i] = sum over row i of pi[j] * p`, rows in
/// index order.
pub fn sparse_markov_chain_action(chain: &[SparseRow], pi: &[f64]) -> Distribution {
    chain
        .iter()
        .map(|row| row.iter().map(|(source, p)| pi[source] * p).sum::<f64>())
        .collect()
}

/// Max absolute per-component difference
pub fn compute_delta(previous: &[f64], next: &[f64]) -> f64 {
    previous
        .iter()
        .zip(next)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

/// Pair each node in `node_order` with its probability
pub fn distribution_to_node_distribution(
    node_order: &[NodeAddress],
    pi: &[f64],
) -> Result<NodeDistribution> {
    if node_order.len() != pi.len() {
        return Err(RankError::structural(format!(
            "node order has {} entries but distribution has {}",
            node_order.len(),
            pi.len()
        )));
    }
    Ok(node_order.iter().cloned().zip(pi.iter().copied()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::connections::create_connections;
    use crate::graph::{Edge, EdgeAddress, MemoryGraph};
    use crate::weights::EdgeWeight;

    fn node(name: &str) -> NodeAddress {
        NodeAddress::from_parts([name]).unwrap()
    }

    #[test]
    fn test_one_node_chain() {
        let mut graph = MemoryGraph::new();
        graph.add_node(node("only"));
        let connections = create_connections(&graph, |_| EdgeWeight::new(1.0, 1.0), 1e-3).unwrap();

        let osmc = create_ordered_sparse_markov_chain(&connections).unwrap();
        assert_eq!(osmc.node_order, vec![node("only")]);
        assert_eq!(osmc.chain.len(), 1);
        assert_eq!(osmc.chain[0].neighbor, vec![0]);
        assert_eq!(osmc.chain[0].weight, vec![1.0]);
    }

    #[test]
    fn test_two_node_chain_probabilities() {
        // a -> b with forward weight 1, self loops 1
        let mut graph = MemoryGraph::new();
        graph.add_node(node("b")).add_node(node("a"));
        graph
            .add_edge(Edge::new(EdgeAddress::from_parts(["ab"]).unwrap(), node("a"), node("b")))
            .unwrap();
        let connections = create_connections(&graph, |_| EdgeWeight::new(1.0, 0.0), 1.0).unwrap();

        let osmc = create_ordered_sparse_markov_chain(&connections).unwrap();
        assert_eq!(osmc.node_order, vec![node("a"), node("b")]);

        // a keeps half of its mass and sends half to b
        assert_eq!(osmc.chain[0].iter().collect::<Vec<_>>(), vec![(0, 0.5), (1, 0.0)]);
        // b keeps all of its own mass (its backward flow is 0) and gets half of a's
        assert_eq!(osmc.chain[1].iter().collect::<Vec<_>>(), vec![(1, 1.0), (0, 0.5)]);
    }

    #[test]
    fn test_node_order_ignores_insertion_order() {
        let build = |names: &[&str]| {
            let mut graph = MemoryGraph::new();
            for name in names {
                graph.add_node(node(name));
            }
            let connections = create_connections(&graph, |_| EdgeWeight::new(1.0, 1.0), 1e-3).unwrap();
            create_ordered_sparse_markov_chain(&connections).unwrap().node_order
        };
        assert_eq!(build(&["c", "a", "b"]), build(&["b", "c", "a"]));
    }

    #[test]
    fn test_from_transition_matrix() {
        let chain = sparse_markov_chain_from_transition_matrix(&[
            vec![0.5, 0.5, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![1.0, 0.0, 0.0],
        ])
        .unwrap();
        assert_eq!(chain[0].iter().collect::<Vec<_>>(), vec![(0, 0.5), (2, 1.0)]);
        assert_eq!(chain[1].iter().collect::<Vec<_>>(), vec![(0, 0.5)]);
        assert_eq!(chain[2].iter().collect::<Vec<_>>(), vec![(1, 1.0)]);
        assert!(validate_chain(&chain).is_ok());
    }

    #[test]
    fn test_from_transition_matrix_rejects_bad_input() {
        assert!(sparse_markov_chain_from_transition_matrix(&[vec![1.0, 0.0]]).is_err());
        assert!(sparse_markov_chain_from_transition_matrix(&[vec![0.5, 0.4], vec![0.0, 1.0]]).is_err());
        assert!(sparse_markov_chain_from_transition_matrix(&[vec![1.5, -0.5], vec![0.0, 1.0]]).is_err());
    }

    #[test]
    fn test_validate_chain_detects_violations() {
        let mut row = SparseRow::default();
        row.push(3, 1.0);
        assert!(validate_chain(&[row]).unwrap_err().is_internal());

        let mut row = SparseRow::default();
        row.push(0, 0.7);
        assert!(validate_chain(&[row]).unwrap_err().is_internal());

        let row = SparseRow {
            neighbor: vec![0, 0],
            weight: vec![1.0],
        };
        assert!(validate_chain(&[row]).is_err());
    }

    #[test]
    fn test_chain_action_and_delta() {
        let chain = sparse_markov_chain_from_transition_matrix(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let next = sparse_markov_chain_action(&chain, &[0.25, 0.75]);
        assert_eq!(next, vec![0.75, 0.25]);
        assert_eq!(compute_delta(&[0.25, 0.75], &next), 0.5);
        assert_eq!(compute_delta(&[], &[]), 0.0);
    }

    #[test]
    fn test_uniform_distribution() {
        assert_eq!(uniform_distribution(4), vec![0.25; 4]);
        assert!(uniform_distribution(0).is_empty());
    }

    #[test]
    fn test_distribution_to_node_distribution() {
        let order = vec![node("a"), node("b")];
        let pi = distribution_to_node_distribution(&order, &[0.1, 0.9]).unwrap();
        assert_eq!(pi[&node("b")], 0.9);

        let err = distribution_to_node_distribution(&order, &[1.0]).unwrap_err();
        assert!(err.is_internal());
    }
}
