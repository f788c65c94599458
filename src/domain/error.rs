// ============================================================
// Layer 3 — Training Error Taxonomy
// ============================================================
// Errors surfaced by the minibatch runner and the checkpoint
// adapter:
//
//   InvalidInput        — bad batch size, empty dataset,
//                         mismatched features/labels, ...
//                         Detected before any batch runs.
//   ComputationFailure  — the model's predict/loss/update
//                         capability failed. Never retried.
//   NotFound            — restore found no checkpoint. The
//                         caller decides whether to start fresh.
//   Storage             — checkpoint files could not be
//                         written or decoded.
//
// Application code works with anyhow::Result; TrainError
// implements std::error::Error so `?` converts it.
//
// Reference: Rust Book §9 (Error Handling), thiserror docs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model computation failed: {0:#}")]
    ComputationFailure(anyhow::Error),

    #[error("no checkpoint found under '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("checkpoint storage failed: {0:#}")]
    Storage(anyhow::Error),
}

impl TrainError {
    pub fn invalid(message: impl Into<String>) -> Self {
        TrainError::InvalidInput(message.into())
    }

    /// Wrap a failure raised by one of the model's capabilities.
    pub fn computation(cause: anyhow::Error) -> Self {
        TrainError::ComputationFailure(cause)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TrainError::NotFound(_))
    }
}
