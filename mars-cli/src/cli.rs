//! Command-line surface
//!
//! Flag names and subcommand shapes here are MARS's own; the spec only
//! constrains behaviour, not the exact clap layout.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mars", version, about = "Multi-Agent Resolution Synthesis: debate several LLMs and synthesize an answer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a debate over a prompt
    Debate {
        /// The question to debate. Prefix with `@` to read from a file.
        prompt: String,

        /// Extra context, repeatable. Prefix with `@` to read from a file.
        #[arg(long = "context")]
        context: Vec<String>,

        /// Provider to include, repeatable. `name` or `name:model`.
        #[arg(long = "provider", required = true)]
        providers: Vec<String>,

        /// Debate mode.
        #[arg(long, value_enum, default_value = "round-robin")]
        mode: ModeArg,

        /// Number of critique rounds.
        #[arg(long, default_value_t = 3)]
        rounds: usize,

        /// Provider that judges in judge mode.
        #[arg(long)]
        judge_provider: Option<String>,

        /// Provider that synthesizes the final answer in round-robin mode.
        #[arg(long)]
        synthesis_provider: Option<String>,

        /// Model override, repeatable. `name:model`.
        #[arg(long = "model")]
        model_overrides: Vec<String>,

        /// Convergence similarity threshold.
        #[arg(long, default_value_t = 0.85)]
        threshold: f64,

        /// Maximum tokens per response.
        #[arg(long, default_value_t = 1024)]
        max_tokens: usize,

        /// Sampling temperature.
        #[arg(long)]
        temperature: Option<f32>,

        /// Stream responses sequentially instead of fanning out in parallel.
        #[arg(long)]
        verbose: bool,

        /// Directory audit runs are written under.
        #[arg(long, default_value = "./mars-runs")]
        output_dir: PathBuf,

        /// Additional retry attempts per provider call.
        #[arg(long, default_value_t = 3)]
        max_retries: usize,
    },

    /// List providers with resolved credentials
    Providers,

    /// Interactively capture provider credentials
    Configure,

    /// Inspect a previous run's audit directory
    Show {
        /// Path to a run directory produced by `debate`.
        run_dir: PathBuf,

        #[arg(value_enum, default_value = "answer")]
        what: ShowWhat,
    },

    /// List previous runs under the default output directory
    History {
        #[arg(long, default_value = "./mars-runs")]
        output_dir: PathBuf,
    },

    /// Copy a previous run's final answer to stdout
    Copy {
        run_dir: PathBuf,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum ModeArg {
    RoundRobin,
    Judge,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum ShowWhat {
    Answer,
    Costs,
    Attribution,
    Rounds,
}

/// Parse `@path` into file contents, passing everything else through
/// unchanged.
pub fn resolve_at_reference(value: &str) -> std::io::Result<String> {
    match value.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path),
        None => Ok(value.to_string()),
    }
}

/// Split a repeatable `name` or `name:model` flag value.
pub fn split_name_model(value: &str) -> (String, Option<String>) {
    match value.split_once(':') {
        Some((name, model)) => (name.to_string(), Some(model.to_string())),
        None => (value.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_name_model_splits_on_first_colon() {
        assert_eq!(split_name_model("anthropic:claude-opus-4"), ("anthropic".to_string(), Some("claude-opus-4".to_string())));
        assert_eq!(split_name_model("anthropic"), ("anthropic".to_string(), None));
    }

    #[test]
    fn resolve_at_reference_passes_through_non_at_values() {
        assert_eq!(resolve_at_reference("plain text").unwrap(), "plain text");
    }

    #[test]
    fn resolve_at_reference_reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.txt");
        std::fs::write(&path, "file contents").unwrap();
        let value = format!("@{}", path.display());
        assert_eq!(resolve_at_reference(&value).unwrap(), "file contents");
    }
}
