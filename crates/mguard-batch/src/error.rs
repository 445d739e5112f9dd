//! Batch error types.

use thiserror::Error;

/// Per-instrument or batch-level failure.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Engine(#[from] mguard_engine::EngineError),

    #[error(transparent)]
    Source(#[from] crate::source::SourceError),

    #[error("Worker task failed: {0}")]
    Task(String),
}

pub type BatchResult<T> = Result<T, BatchError>;
