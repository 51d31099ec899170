//! Shared error taxonomy and small types for pipeline IR partial runs.
//!
//! This crate provides the foundational types used across the other crates:
//! - `PartialRunError`: unified error taxonomy
//! - `Direction`: which edge list a traversal or ordering check follows

use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge direction in a pipeline graph.
///
/// `Upstream` follows a node's producers, `Downstream` its consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Upstream,
    Downstream,
}

impl Direction {
    /// Where a neighbor in this direction must sit relative to the node in a
    /// topologically sorted sequence.
    pub fn expected_position(&self) -> &'static str {
        match self {
            Direction::Upstream => "before",
            Direction::Downstream => "after",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upstream => f.write_str("upstream"),
            Direction::Downstream => f.write_str("downstream"),
        }
    }
}

/// Unified error type for all partial-run subsystems.
#[derive(Debug, thiserror::Error)]
pub enum PartialRunError {
    // === Precondition Errors ===
    #[error("Pipeline filtering is only supported for SYNC pipelines, got {mode}")]
    UnsupportedExecutionMode { mode: String },

    #[error("Pipeline filtering is not supported for pipelines with sub-pipelines; found sub-pipeline '{pipeline_id}'")]
    SubPipelineNotSupported { pipeline_id: String },

    #[error(
        "Input pipeline is not topologically sorted: node '{node}' has {direction} node '{neighbor}', \
         but '{neighbor}' does not appear {} '{node}'",
        .direction.expected_position()
    )]
    NotTopologicallySorted {
        node: String,
        neighbor: String,
        direction: Direction,
    },

    #[error("Node id '{node}' appears more than once in the pipeline")]
    DuplicateNodeId { node: String },

    // === Selector Errors ===
    #[error("Invalid node selector pattern '{pattern}': {message}")]
    InvalidSelector { pattern: String, message: String },

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PartialRunError {
    /// Returns `true` if the error reports a malformed input pipeline.
    ///
    /// These are caller errors: retrying with the same IR never helps.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            PartialRunError::UnsupportedExecutionMode { .. }
                | PartialRunError::SubPipelineNotSupported { .. }
                | PartialRunError::NotTopologicallySorted { .. }
                | PartialRunError::DuplicateNodeId { .. }
        )
    }
}

/// A convenience alias for `Result<T, PartialRunError>`.
pub type Result<T> = std::result::Result<T, PartialRunError>;
