//! MARS debate orchestration engine
//!
//! Dispatches a prompt to several LLM providers concurrently, runs
//! rounds of cross-critique, detects convergence, and synthesizes a
//! final answer with attribution and cost accounting. This crate is the
//! orchestration core; `mars-cli` wires it to a terminal.
//!
//! The typical entry point is [`engine::run`], given a [`config::DebateConfig`],
//! a [`provider::Registry`] of constructed providers, a [`render::Renderer`],
//! and a [`writer::AuditWriter`].

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod render;
pub mod strategy;
pub mod types;
pub mod writer;

pub use config::{Credentials, DebateConfig, Mode};
pub use engine::{run, RunOutcome};
pub use error::{ConfigError, Result, RunError};
pub use provider::{Provider, ProviderError, Registry, RetryConfig};
pub use types::{AttributionReport, CostReport, DebateResult, DebateRound, LLMResponse, Message, ProviderAttribution, ProviderCost, Role, TokenUsage};
