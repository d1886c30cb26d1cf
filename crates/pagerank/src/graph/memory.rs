//! In-memory graph
//!
//! Nodes and edges live in ordered maps, so every iteration order is a pure
//! function of the graph's contents and never of insertion order.

use super::{Direction, Edge, EdgeAddress, Graph, Neighbor, NeighborsOptions, NodeAddress};
use credrank_common::errors::{RankError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// In-memory multigraph
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    /// All nodes
    nodes: BTreeSet<NodeAddress>,

    /// All edges by address
    edges: BTreeMap<EdgeAddress, Edge>,

    /// Reverse adjacency: node -> edges whose dst is the node
    incoming: BTreeMap<NodeAddress, BTreeSet<EdgeAddress>>,

    /// Adjacency: node -> edges whose src is the node
    outgoing: BTreeMap<NodeAddress, BTreeSet<EdgeAddress>>,
}

impl MemoryGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Adding an existing node is a no-op.
    pub fn add_node(&mut self, address: NodeAddress) -> &mut Self {
        self.nodes.insert(address);
        self
    }

    /// Add an edge. Both endpoints must already be present.
    ///
    /// Re-adding an identical edge is a no-op; adding a different edge under
    /// an existing address fails.
    pub fn add_edge(&mut self, edge: Edge) -> Result<&mut Self> {
        for endpoint in [&edge.src, &edge.dst] {
            if !self.nodes.contains(endpoint) {
                return Err(RankError::DanglingEdge {
                    edge: edge.address.to_string(),
                    endpoint: endpoint.to_string(),
                });
            }
        }

        match self.edges.get(&edge.address).map(|existing| *existing == edge) {
            Some(true) => return Ok(self),
            Some(false) => {
                return Err(RankError::ConflictingEdge {
                    edge: edge.address.to_string(),
                })
            }
            None => {}
        }

        self.outgoing
            .entry(edge.src.clone())
            .or_default()
            .insert(edge.address.clone());
        self.incoming
            .entry(edge.dst.clone())
            .or_default()
            .insert(edge.address.clone());
        self.edges.insert(edge.address.clone(), edge);
        Ok(self)
    }

    pub fn edge(&self, address: &EdgeAddress) -> Option<&Edge> {
        self.edges.get(address)
    }

    pub fn has_edge(&self, address: &EdgeAddress) -> bool {
        self.edges.contains_key(address)
    }

    fn adjacent<'a>(
        &'a self,
        index: &'a BTreeMap<NodeAddress, BTreeSet<EdgeAddress>>,
        node: &NodeAddress,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        index
            .get(node)
            .into_iter()
            .flatten()
            .filter_map(|address| self.edges.get(address))
    }
}

impl Graph for MemoryGraph {
    fn nodes(&self) -> impl Iterator<Item = &NodeAddress> + '_ {
        self.nodes.iter()
    }

    fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    fn has_node(&self, address: &NodeAddress) -> bool {
        self.nodes.contains(address)
    }

    fn neighbors<'a>(
        &'a self,
        node: &NodeAddress,
        options: &NeighborsOptions,
    ) -> Vec<Neighbor<'a>> {
        let mut result = Vec::new();
        let edge_matches = |edge: &Edge| edge.address.has_prefix(&options.edge_prefix);

        if matches!(options.direction, Direction::In | Direction::Any) {
            for edge in self.adjacent(&self.incoming, node).filter(|e| edge_matches(e)) {
                if edge.src.has_prefix(&options.node_prefix) {
                    result.push(Neighbor {
                        node: &edge.src,
                        edge,
                    });
                }
            }
        }

        if matches!(options.direction, Direction::Out | Direction::Any) {
            for edge in self.adjacent(&self.outgoing, node).filter(|e| edge_matches(e)) {
                // A loop edge was already reported as incoming
                if options.direction == Direction::Any && edge.is_loop() {
                    continue;
                }
                if edge.dst.has_prefix(&options.node_prefix) {
                    result.push(Neighbor {
                        node: &edge.dst,
                        edge,
                    });
                }
            }
        }

        result
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
