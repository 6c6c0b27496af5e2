//! Error taxonomy for the explorer.
//!
//! Every failure a tool call can produce maps onto one of these variants;
//! the server layer renders them as MCP error results. No retries happen at
//! this layer — a failed driver call fails the operation immediately.

use thiserror::Error;

/// Errors surfaced by schema lookups and query execution.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// The requested database is not on the configured allow-list.
    /// Raised before any statement reaches the server.
    #[error("access denied to database \"{database}\". Allowed databases: {}", allowed.join(", "))]
    AccessDenied {
        database: String,
        allowed: Vec<String>,
    },

    /// The query failed the read-only policy while write operations are
    /// disabled.
    #[error("write operations are disabled: {0}")]
    PolicyViolation(String),

    /// The underlying driver call failed (network, syntax, permissions,
    /// timeout).
    #[error("query execution failed: {0}")]
    Execution(String),

    /// An object name resolved to no metadata rows where one was required.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid or incomplete server configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<tiberius::error::Error> for ExplorerError {
    fn from(err: tiberius::error::Error) -> Self {
        ExplorerError::Execution(err.to_string())
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::Execution(format!("result decoding failed: {err}"))
    }
}

impl From<std::io::Error> for ExplorerError {
    fn from(err: std::io::Error) -> Self {
        ExplorerError::Execution(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
