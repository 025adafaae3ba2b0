//! Daemon error types.

use thiserror::Error;
use trailbot_connectors::FeedError;
use trailbot_domain::DomainError;
use trailbot_engine::EngineError;
use trailbot_store::StoreError;

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Domain error
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Engine error
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Market data feed error
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
