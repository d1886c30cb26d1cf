//! Graph boundary consumed by the ranking core
//!
//! The ranking core only needs to list nodes, list edges and query
//! neighbours. Anything that can answer those questions can be ranked;
//! `MemoryGraph` is the in-process implementation.

mod address;
mod memory;

pub use address::{Address, AddressKind, EdgeAddress, EdgeKind, NodeAddress, NodeKind};
pub use memory::MemoryGraph;

use serde::Serialize;

/// Directed, typed edge. The edge type is encoded in the address prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub address: EdgeAddress,
    pub src: NodeAddress,
    pub dst: NodeAddress,
}

impl Edge {
    pub fn new(address: EdgeAddress, src: NodeAddress, dst: NodeAddress) -> Self {
        Self { address, src, dst }
    }

    pub fn is_loop(&self) -> bool {
        self.src == self.dst
    }
}

/// Which edges to follow from a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Edges whose `dst` is the node
    In,
    /// Edges whose `src` is the node
    Out,
    /// Either
    Any,
}

/// Filter for `Graph::neighbors`
#[derive(Debug, Clone)]
pub struct NeighborsOptions {
    pub direction: Direction,
    /// Only neighbours whose address has this prefix
    pub node_prefix: NodeAddress,
    /// Only edges whose address has this prefix
    pub edge_prefix: EdgeAddress,
}

impl Default for NeighborsOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Any,
            node_prefix: NodeAddress::empty(),
            edge_prefix: EdgeAddress::empty(),
        }
    }
}

/// A neighbouring node together with the edge that connects it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor<'a> {
    pub node: &'a NodeAddress,
    pub edge: &'a Edge,
}

/// Immutable graph snapshot
///
/// Iteration order must be deterministic for a given snapshot.
pub trait Graph {
    fn nodes(&self) -> impl Iterator<Item = &NodeAddress> + '_;

    fn edges(&self) -> impl Iterator<Item = &Edge> + '_;

    fn has_node(&self, address: &NodeAddress) -> bool;

    /// Neighbours of `node`. Loop edges are reported once.
    fn neighbors<'a>(
        &'a self,
        node: &NodeAddress,
        options: &NeighborsOptions,
    ) -> Vec<Neighbor<'a>>;

    fn node_count(&self) -> usize {
        self.nodes().count()
    }

    fn edge_count(&self) -> usize {
        self.edges().count()
    }
}
