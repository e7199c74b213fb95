//! Graph-subsystem error type.

use thiserror::Error;

use fleet_core::VertexId;

/// Errors produced by `fleet-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: VertexId, to: VertexId },

    #[error("vertex {0} not found in graph")]
    VertexNotFound(VertexId),

    #[error("malformed map document: {0}")]
    Format(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;
