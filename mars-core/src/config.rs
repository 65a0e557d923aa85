//! Debate configuration and credential resolution
//!
//! Credentials are resolved once, before a debate starts, from three
//! layers in descending precedence: process environment, a local `.env`,
//! and a user-home config file. Resolution happens eagerly so missing
//! credentials surface as a [`ConfigError`] rather than failing mid-debate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// How a debate should be run: full round-robin critique, or a single
/// judged round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    RoundRobin,
    Judge,
}

/// Immutable configuration for one debate run.
#[derive(Debug, Clone)]
pub struct DebateConfig {
    pub providers: Vec<String>,
    pub model_overrides: HashMap<String, String>,
    pub mode: Mode,
    pub rounds: usize,
    pub judge_provider: Option<String>,
    pub synthesis_provider: Option<String>,
    pub threshold: f64,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
    pub max_retries: usize,
    pub output_dir: PathBuf,
    pub verbose: bool,
}

impl DebateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds < 1 {
            return Err(ConfigError::InvalidRounds);
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "threshold".into(),
                message: "must be within [0, 1]".into(),
            });
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_tokens".into(),
                message: "must be > 0".into(),
            });
        }
        if let Some(temp) = self.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(ConfigError::InvalidValue {
                    field: "temperature".into(),
                    message: "must be within [0, 2]".into(),
                });
            }
        }
        let distinct: std::collections::HashSet<_> = self.providers.iter().collect();
        if distinct.len() != self.providers.len() {
            return Err(ConfigError::InvalidValue {
                field: "providers".into(),
                message: "provider names must be distinct".into(),
            });
        }
        match self.mode {
            Mode::Judge => {
                let judge = self.judge_provider.as_ref().ok_or(ConfigError::MissingJudgeProvider)?;
                if !self.providers.contains(judge) {
                    return Err(ConfigError::MissingJudgeProvider);
                }
            }
            Mode::RoundRobin => {
                if let Some(synth) = &self.synthesis_provider {
                    if !self.providers.contains(synth) {
                        return Err(ConfigError::UnknownSynthesisProvider(synth.clone()));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Resolved API keys and base URLs for every vendor MARS knows about.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub ollama_base_url: Option<String>,
    pub default_providers: Option<String>,
}

impl Credentials {
    /// Resolve credentials from, in descending precedence: process
    /// environment variables prefixed `MARS_`, a `.env` file in the
    /// current directory, and `~/.config/mars/credentials.env`.
    ///
    /// Each layer is loaded into the process environment (without
    /// overwriting a value a higher-precedence layer already set) before
    /// the final read, mirroring `dotenvy`'s layered-load convention.
    pub fn resolve() -> Self {
        Self::resolve_from(Path::new(".env"), home_config_path().as_deref())
    }

    fn resolve_from(dotenv_path: &Path, home_config: Option<&Path>) -> Self {
        if dotenv_path.exists() {
            let _ = dotenvy::from_path(dotenv_path);
        }
        if let Some(path) = home_config {
            if path.exists() {
                let _ = dotenvy::from_path(path);
            }
        }
        Self {
            anthropic_api_key: std::env::var("MARS_ANTHROPIC_API_KEY").ok(),
            openai_api_key: std::env::var("MARS_OPENAI_API_KEY").ok(),
            google_api_key: std::env::var("MARS_GOOGLE_API_KEY").ok(),
            ollama_base_url: std::env::var("MARS_OLLAMA_BASE_URL").ok(),
            default_providers: std::env::var("MARS_DEFAULT_PROVIDERS").ok(),
        }
    }
}

fn home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("mars").join("credentials.env"))
}
