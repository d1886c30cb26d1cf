//! Inbound connections per node
//!
//! Every edge can carry mass in both directions: the forward weight flows
//! from `src` into `dst`, the backward weight from `dst` into `src`. Every
//! node additionally receives one synthetic self-loop.

use crate::graph::{Edge, Graph, NodeAddress};
use crate::weights::EdgeWeight;
use credrank_common::errors::{RankError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Why mass can flow into a node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Adjacency {
    /// Synthetic self-loop on `node`
    SelfLoop { node: NodeAddress },
    /// The node is the edge's `dst`; mass arrives from `src`
    InEdge { edge: Edge },
    /// The node is the edge's `src`; mass arrives from `dst`
    OutEdge { edge: Edge },
}

impl Adjacency {
    /// The node whose mass flows along this adjacency
    pub fn source(&self) -> &NodeAddress {
        match self {
            Adjacency::SelfLoop { node } => node,
            Adjacency::InEdge { edge } => &edge.src,
            Adjacency::OutEdge { edge } => &edge.dst,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        matches!(self, Adjacency::SelfLoop { .. })
    }
}

/// A weighted inbound connection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub adjacency: Adjacency,
    pub weight: f64,
}

/// Inbound connections of every node, self-loop first
pub type Connections = BTreeMap<NodeAddress, Vec<Connection>>;

/// Build the inbound connections of every node in `graph`.
///
/// `edge_weight` is called exactly once per edge, in edge order.
pub fn create_connections<G, F>(
    graph: &G,
    mut edge_weight: F,
    self_loop_weight: f64,
) -> Result<Connections>
where
    G: Graph,
    F: FnMut(&Edge) -> EdgeWeight,
{
    if !self_loop_weight.is_finite() || self_loop_weight < 0.0 {
        return Err(RankError::configuration(format!(
            "self_loop_weight must be finite and nonnegative, got {}",
            self_loop_weight
        )));
    }

    let mut connections: Connections = graph
        .nodes()
        .map(|node| {
            let self_loop = Connection {
                adjacency: Adjacency::SelfLoop { node: node.clone() },
                weight: self_loop_weight,
            };
            (node.clone(), vec![self_loop])
        })
        .collect();

    // Outbound totals must stay finite or nothing can be normalized
    let mut out_totals: BTreeMap<NodeAddress, f64> = connections
        .keys()
        .map(|node| (node.clone(), self_loop_weight))
        .collect();

    for edge in graph.edges() {
        let weight = edge_weight(edge);
        weight.check(&edge.address.to_string())?;
        accumulate_out_weight(&mut out_totals, &edge.src, weight.to_weight)?;
        accumulate_out_weight(&mut out_totals, &edge.dst, weight.fro_weight)?;

        push_connection(
            &mut connections,
            &edge.dst,
            Connection {
                adjacency: Adjacency::InEdge { edge: edge.clone() },
                weight: weight.to_weight,
            },
        )?;
        push_connection(
            &mut connections,
            &edge.src,
            Connection {
                adjacency: Adjacency::OutEdge { edge: edge.clone() },
                weight: weight.fro_weight,
            },
        )?;
    }

    Ok(connections)
}

/// Total weight leaving each node across all connections it sources.
///
/// This is the normalizer of every connection probability: a connection's
/// probability is its weight over its source's total. Fails when a node has
/// nothing to normalize by.
pub fn total_out_weights(connections: &Connections) -> Result<BTreeMap<&NodeAddress, f64>> {
    let mut totals: BTreeMap<&NodeAddress, f64> =
        connections.keys().map(|node| (node, 0.0)).collect();

    for connection in connections.values().flatten() {
        let source = connection.adjacency.source();
        match totals.get_mut(source) {
            Some(total) => *total += connection.weight,
            None => {
                return Err(RankError::structural(format!(
                    "connection sourced from unknown node {}",
                    source
                )))
            }
        }
    }

    for (node, total) in &totals {
        if !(total.is_finite() && *total > 0.0) {
            return Err(RankError::normalization(format!(
                "node {} has total outbound weight {}; cannot normalize",
                node, total
            )));
        }
    }

    Ok(totals)
}

fn accumulate_out_weight(
    totals: &mut BTreeMap<NodeAddress, f64>,
    source: &NodeAddress,
    weight: f64,
) -> Result<()> {
    let Some(total) = totals.get_mut(source) else {
        return Err(RankError::structural(format!(
            "graph lists an edge touching {} but not the node itself",
            source
        )));
    };
    *total += weight;
    if !total.is_finite() {
        return Err(RankError::configuration(format!(
            "outbound edge weights of node {} overflow to {}",
            source, total
        )));
    }
    Ok(())
}

fn push_connection(
    connections: &mut Connections,
    target: &NodeAddress,
    connection: Connection,
) -> Result<()> {
    match connections.get_mut(target) {
        Some(list) => {
            list.push(connection);
            Ok(())
        }
        None => Err(RankError::structural(format!(
            "graph lists an edge touching {} but not the node itself",
            target
        ))),
    }
}
