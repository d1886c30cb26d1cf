//! CredRank Common Library
//!
//! Shared code for the CredRank crates:
//! - Error types and handling
//! - Configuration management
//! - Tracing setup
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod metrics;
pub mod telemetry;

// Re-export commonly used types
pub use config::{PagerankConfig, RankConfig};
pub use errors::{ErrorCode, RankError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
