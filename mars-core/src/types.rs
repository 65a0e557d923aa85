//! Core data types shared across the debate engine
//!
//! These types model the conversation primitives (`Message`), the outcome of
//! a single model call (`LLMResponse`), and the accumulated record of a full
//! debate (`DebateRound`, `DebateResult`). They are immutable once produced:
//! a strategy builds them once and the engine, analyzers, and writer only
//! ever read them back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The role a message plays in a conversation sent to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the sequence sent to a provider's `generate`/`stream`
/// call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Token counts reported by a provider for one call.
///
/// Zero is a legitimate value for providers (e.g. local models) that cannot
/// report usage; it is distinct from "not yet known", which is represented
/// by the absence of a `TokenUsage` on in-progress streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn combine(&self, other: &TokenUsage) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
        }
    }
}

/// A completed response from a single provider call.
///
/// Once constructed an `LLMResponse` is never mutated; strategies build a
/// new one per round rather than editing in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub provider: String,
    pub model: String,
    pub content: String,
    pub usage: TokenUsage,
}

impl LLMResponse {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        content: impl Into<String>,
        usage: TokenUsage,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            content: content.into(),
            usage,
        }
    }

    /// Split a response produced by a synthesis/judge phase on the
    /// `## Final Answer` marker. The match is case-sensitive and occurs on a
    /// line boundary; only the first occurrence is treated as the separator
    /// (see `prompt::split_final_answer`).
    pub fn split_final_answer(&self) -> (String, String) {
        crate::prompt::split_final_answer(&self.content)
    }
}

/// Round index 0 is reserved for the synthesis/judge step; critique rounds
/// run from 1..=rounds (round 1 is the initial round, which has no critique
/// mapping).
pub const SYNTHESIS_ROUND: usize = 0;

/// All responses produced for one round of the debate.
///
/// Providers that failed during this round are simply absent from
/// `answers` (and `critiques`). A round is valid as long as at least one
/// provider succeeded; this is enforced by the strategy, not by this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebateRound {
    pub round: usize,
    pub answers: BTreeMap<String, LLMResponse>,
    pub critiques: BTreeMap<String, LLMResponse>,
}

impl DebateRound {
    pub fn new(round: usize) -> Self {
        Self {
            round,
            answers: BTreeMap::new(),
            critiques: BTreeMap::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.answers.is_empty()
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.answers.keys().map(String::as_str)
    }
}

/// The complete, immutable record of one debate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateResult {
    pub prompt: String,
    pub context: Vec<String>,
    pub rounds: Vec<DebateRound>,
    pub synthesis: Option<LLMResponse>,
    pub final_answer: String,
    pub resolution: String,
    pub convergence_reason: String,
}

impl DebateResult {
    /// The most recent round that has at least one answer, if any.
    pub fn last_round(&self) -> Option<&DebateRound> {
        self.rounds.last()
    }

    pub fn round(&self, index: usize) -> Option<&DebateRound> {
        self.rounds.iter().find(|r| r.round == index)
    }
}

/// Per-provider attribution metrics over the final answer, in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAttribution {
    pub provider: String,
    pub contribution: f64,
    pub survival: f64,
    pub influence: f64,
    pub novel_in_synthesis: f64,
}

/// Sentence-level change summary between two consecutive rounds for one
/// provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundDiff {
    pub provider: String,
    pub from_round: usize,
    pub to_round: usize,
    pub similarity: f64,
    pub sentences_added: usize,
    pub sentences_removed: usize,
    pub sentences_unchanged: usize,
}

/// Full attribution analysis over a `DebateResult`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributionReport {
    pub attributions: Vec<ProviderAttribution>,
    pub round_diffs: Vec<RoundDiff>,
    pub novel_in_synthesis: f64,
}

/// Per-provider token and dollar cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCost {
    pub provider: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub usd_cost: f64,
    pub share_of_total: f64,
}

/// Full cost analysis over a `DebateResult`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostReport {
    pub providers: Vec<ProviderCost>,
    pub total_usd_cost: f64,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_usage_combine_sums_fields() {
        let a = TokenUsage::new(10, 20);
        let b = TokenUsage::new(1, 2);
        let c = a.combine(&b);
        assert_eq!(c.input_tokens, 11);
        assert_eq!(c.output_tokens, 22);
    }

    #[test]
    fn debate_round_is_valid_requires_an_answer() {
        let mut round = DebateRound::new(1);
        assert!(!round.is_valid());
        round.answers.insert(
            "anthropic".to_string(),
            LLMResponse::new("anthropic", "claude", "hi", TokenUsage::default()),
        );
        assert!(round.is_valid());
    }
}
