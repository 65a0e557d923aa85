//! Top-level error types for MARS
//!
//! This module flattens the internal error hierarchy (provider errors,
//! configuration errors) into the categories described in the spec's error
//! handling design: configuration errors are caught before a debate starts,
//! transient/permanent provider failures are handled inside a strategy, and
//! only unrecoverable failures bubble up as a `RunError`.

use thiserror::Error;

use crate::provider::ProviderError;

/// Configuration errors, detected before a debate begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("missing credentials for provider: {0}")]
    MissingCredentials(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("judge mode requires judge_provider to be set and present in providers")]
    MissingJudgeProvider,

    #[error("synthesis_provider {0} is not present in providers")]
    UnknownSynthesisProvider(String),

    #[error("rounds must be >= 1")]
    InvalidRounds,
}

/// A run-level failure: something a strategy could not recover from.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Every provider failed in one round; carries the first recorded cause.
    #[error("round {round} failed: every provider failed ({cause})")]
    RoundFailed { round: usize, cause: String },

    /// Every synthesis/judge candidate failed.
    #[error("synthesis exhausted: every candidate provider failed ({cause})")]
    SynthesisExhausted { cause: String },

    /// The judge call failed after retry exhaustion; judge mode has no
    /// fallback.
    #[error("judge failed: {0}")]
    JudgeFailed(String),

    /// The enclosing run was cancelled before completion.
    #[error("run cancelled")]
    Cancelled,

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_run_error() {
        let err: RunError = ConfigError::MissingJudgeProvider.into();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn is_cancelled_only_true_for_cancelled_variant() {
        assert!(RunError::Cancelled.is_cancelled());
        assert!(!RunError::JudgeFailed("x".into()).is_cancelled());
    }
}
