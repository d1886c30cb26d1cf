//! Error types for CredRank
//!
//! Provides a single error taxonomy for every ranking stage:
//! - Configuration errors (bad options, negative edge weights, bad addresses)
//! - Normalization errors (no probability mass to rescale)
//! - Structural invariant violations (bugs in chain construction)
//! - Runtime interruptions (cancellation)
//!
//! Non-convergence is deliberately absent: it is reported as data, not as
//! an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using RankError
pub type Result<T> = std::result::Result<T, RankError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors (1xxx)
    ConfigurationError,
    NegativeEdgeWeight,
    InvalidAddress,
    DanglingEdge,
    ConflictingEdge,

    // Normalization errors (2xxx)
    NormalizationError,

    // Structural errors (3xxx)
    StructuralInvariantViolation,

    // Runtime errors (4xxx)
    Cancelled,

    // Internal errors (9xxx)
    ConfigLoadError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ConfigurationError => 1001,
            ErrorCode::NegativeEdgeWeight => 1002,
            ErrorCode::InvalidAddress => 1003,
            ErrorCode::DanglingEdge => 1004,
            ErrorCode::ConflictingEdge => 1005,

            ErrorCode::NormalizationError => 2001,

            ErrorCode::StructuralInvariantViolation => 3001,

            ErrorCode::Cancelled => 4001,

            ErrorCode::ConfigLoadError => 9001,
            ErrorCode::SerializationError => 9002,
        }
    }
}

/// Ranking error types
#[derive(Error, Debug)]
pub enum RankError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Negative edge weight on {edge}: to={to_weight}, fro={fro_weight}")]
    NegativeEdgeWeight {
        edge: String,
        to_weight: f64,
        fro_weight: f64,
    },

    #[error("Invalid address part {part:?}: parts may not contain NUL")]
    InvalidAddress { part: String },

    #[error("Edge {edge} references missing node {endpoint}")]
    DanglingEdge { edge: String, endpoint: String },

    #[error("Conflicting edge at address {edge}")]
    ConflictingEdge { edge: String },

    // Normalization errors
    #[error("Normalization error: {message}")]
    Normalization { message: String },

    // Structural errors
    #[error("Structural invariant violated: {message}")]
    StructuralInvariant { message: String },

    // Runtime
    #[error("Ranking cancelled after {iterations} iterations")]
    Cancelled { iterations: usize },

    // Internal
    #[error("Configuration load error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RankError {
    /// Shorthand for a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        RankError::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for a normalization error
    pub fn normalization(message: impl Into<String>) -> Self {
        RankError::Normalization {
            message: message.into(),
        }
    }

    /// Shorthand for a structural invariant violation
    pub fn structural(message: impl Into<String>) -> Self {
        RankError::StructuralInvariant {
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            RankError::Configuration { .. } => ErrorCode::ConfigurationError,
            RankError::NegativeEdgeWeight { .. } => ErrorCode::NegativeEdgeWeight,
            RankError::InvalidAddress { .. } => ErrorCode::InvalidAddress,
            RankError::DanglingEdge { .. } => ErrorCode::DanglingEdge,
            RankError::ConflictingEdge { .. } => ErrorCode::ConflictingEdge,
            RankError::Normalization { .. } => ErrorCode::NormalizationError,
            RankError::StructuralInvariant { .. } => ErrorCode::StructuralInvariantViolation,
            RankError::Cancelled { .. } => ErrorCode::Cancelled,
            RankError::Config(_) => ErrorCode::ConfigLoadError,
            RankError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Caller-supplied input or options were invalid
    pub fn is_configuration_error(&self) -> bool {
        matches!(self.code().as_code(), 1000..=1999)
    }

    /// A bug in the engine rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(self, RankError::StructuralInvariant { .. })
    }
}
