//! Graph to Markov chain, and the chain's stationary distribution

mod chain;
mod connections;
mod stationary;

pub use chain::{
    compute_delta, create_ordered_sparse_markov_chain, distribution_to_node_distribution,
    sparse_markov_chain_action, sparse_markov_chain_from_transition_matrix, uniform_distribution,
    validate_chain, Distribution, NodeDistribution, OrderedSparseMarkovChain, SparseMarkovChain,
    SparseRow, STOCHASTIC_TOLERANCE,
};
pub use connections::{create_connections, total_out_weights, Adjacency, Connection, Connections};
pub use stationary::{
    find_stationary_distribution, ConvergenceReport, StationaryDistribution,
    StationaryDistributionOptions,
};
