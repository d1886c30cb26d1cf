//! CredRank Ranking Core
//!
//! Ranks the nodes of a weighted, directed multigraph with a PageRank-style
//! random walk and explains every score:
//! - Typed node and edge addresses, and an in-memory graph
//! - Edge weighting, including weights by edge-address prefix
//! - Markov chain construction with synthetic self-loops
//! - Power iteration with cooperative yielding and cancellation
//! - Score normalization and per-connection decomposition

pub mod attribution;
pub mod decomposition;
pub mod graph;
pub mod pagerank;
pub mod score;
pub mod weights;

pub use decomposition::{NodeDecomposition, PagerankNodeDecomposition, ScoredConnection};
pub use graph::{Edge, EdgeAddress, Graph, MemoryGraph, NodeAddress};
pub use pagerank::{pagerank, pagerank_cancellable, PagerankOptions, PagerankResult};
pub use score::NodeScore;
pub use weights::{EdgeTypeWeights, EdgeWeight};
