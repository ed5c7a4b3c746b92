//! Error handling for the gateway
//!
//! This module defines the error types used throughout the gateway.
//!
//! The four routing failures a caller can observe (`no-providers-available`,
//! `all-providers-failed`, `all-subtasks-failed`,
//! `no-embedding-provider-available`) render exactly as those strings via
//! `Display`. Provider-level errors never reach the caller directly; they are
//! folded into health records at the call site and surface only as one of the
//! aggregate variants.

use thiserror::Error;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The availability filter produced an empty provider set
    #[error("no-providers-available")]
    NoProvidersAvailable,

    /// Every raced or sequentially-tried provider failed (or the race ceiling fired)
    #[error("all-providers-failed")]
    AllProvidersFailed {
        /// Per-provider failure descriptions collected before giving up
        errors: Vec<String>,
    },

    /// Every fanned-out subtask of a decomposition failed
    #[error("all-subtasks-failed")]
    AllSubtasksFailed {
        /// Per-subtask failure descriptions
        failed: Vec<String>,
    },

    /// No enabled provider advertises the embed capability, or all of them failed
    #[error("no-embedding-provider-available")]
    NoEmbeddingProviderAvailable,

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// YAML parsing errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
