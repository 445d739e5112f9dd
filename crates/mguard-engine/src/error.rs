//! Engine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] mguard_core::CoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;
