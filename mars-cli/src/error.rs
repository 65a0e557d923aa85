//! Top-level CLI error type
//!
//! `main` converts any `CliError` into a process exit code; everything
//! below the CLI boundary uses `mars_core::RunError`/`ConfigError`
//! directly.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Run(#[from] mars_core::RunError),

    #[error(transparent)]
    Config(#[from] mars_core::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Non-zero exit codes, distinguishing configuration mistakes from
    /// run-time failures so scripts can tell them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Run(e) if e.is_cancelled() => 130,
            _ => 1,
        }
    }
}
