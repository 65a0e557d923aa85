//! Round-robin strategy: N rounds of critique, then synthesis with fallback
//!
//! States: `INITIAL -> (CRITIQUE -> CONVERGENCE_CHECK)* -> SYNTHESIS -> DONE`,
//! with `FAILED` reachable only from synthesis exhaustion. The state names
//! aren't reified as an enum — the `run` method's control flow *is* the
//! state machine — but each block below is labelled with the state it
//! implements.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::analysis::similarity::ratio;
use crate::error::{Result, RunError};
use crate::prompt;
use crate::types::{DebateResult, DebateRound, LLMResponse};

use super::{dispatch_round, DebateContext, Strategy};

pub struct RoundRobinStrategy;

#[async_trait]
impl Strategy for RoundRobinStrategy {
    async fn run(&self, ctx: &DebateContext, prompt_text: &str, context: &[String]) -> Result<DebateResult> {
        let provider_names = ctx.config.providers.clone();

        // INITIAL
        ctx.renderer.round_started(1, ctx.config.rounds);
        let initial_context = context.to_vec();
        let answers = dispatch_round(ctx, &provider_names, 1, |_| prompt::build_initial(prompt_text, &initial_context)).await;
        if answers.is_empty() {
            return Err(RunError::RoundFailed {
                round: 1,
                cause: "every provider failed in the initial round".to_string(),
            });
        }
        let mut round = DebateRound::new(1);
        round.answers = answers;
        ctx.renderer.round_completed(1, &round.providers().map(str::to_string).collect::<Vec<_>>());
        ctx.writer.write_round_responses(&round).await?;
        let mut rounds = vec![round];
        let mut convergence_reason = "max rounds".to_string();

        // (CRITIQUE -> CONVERGENCE_CHECK)*
        for round_index in 2..=ctx.config.rounds {
            let previous = rounds.last().unwrap();
            let alive: Vec<String> = previous.providers().map(str::to_string).collect();
            let previous_answers = previous.answers.clone();

            ctx.renderer.round_started(round_index, ctx.config.rounds);
            let responses = dispatch_round(ctx, &alive, round_index, |name| prompt::build_critique(name, prompt_text, &previous_answers)).await;
            if responses.is_empty() {
                return Err(RunError::RoundFailed {
                    round: round_index,
                    cause: "every remaining provider failed in this critique round".to_string(),
                });
            }

            let mut current = DebateRound::new(round_index);
            current.answers = responses.clone();
            current.critiques = responses;
            ctx.renderer.round_completed(round_index, &current.providers().map(str::to_string).collect::<Vec<_>>());
            ctx.writer.write_round_responses(&current).await?;
            ctx.writer.write_round_critiques(&current).await?;

            let converged = check_convergence(&previous_answers, &current.answers, ctx.config.threshold);
            rounds.push(current);

            if converged {
                convergence_reason = format!(
                    "Answers converged after round {round_index} (similarity threshold {:.2} reached)",
                    ctx.config.threshold
                );
                ctx.renderer.convergence(&convergence_reason);
                break;
            }
        }
        ctx.writer.write_convergence(&convergence_reason).await?;

        // SYNTHESIS
        let latest = &rounds.last().unwrap().answers;
        let synthesis_order = synthesis_provider_order(ctx);
        let mut last_cause = None;
        let mut synthesis_response: Option<LLMResponse> = None;

        for (i, name) in synthesis_order.iter().enumerate() {
            let Some(provider) = ctx.registry.get(name) else {
                continue;
            };
            ctx.renderer.synthesis_attempt(name);
            let messages = prompt::build_synthesis(prompt_text, latest);
            let model = ctx.config.model_overrides.get(name).cloned();
            match provider.generate(&messages, model.as_deref(), ctx.config.max_tokens, ctx.config.temperature).await {
                Ok((content, usage)) => {
                    let model = model.unwrap_or_else(|| provider.default_model().to_string());
                    synthesis_response = Some(LLMResponse::new(name.clone(), model, content, usage));
                    break;
                }
                Err(e) => {
                    if let Some(next) = synthesis_order.get(i + 1) {
                        ctx.renderer.synthesis_fallback(name, next, &e.to_string());
                    }
                    last_cause = Some(e.to_string());
                }
            }
        }

        let Some(synthesis) = synthesis_response else {
            let cause = last_cause.unwrap_or_else(|| "no synthesis candidate was configured".to_string());
            ctx.renderer.run_failed(&cause);
            return Err(RunError::SynthesisExhausted { cause });
        };

        let (resolution, final_answer) = prompt::split_final_answer(&synthesis.content);
        ctx.writer.write_resolution(&resolution).await?;
        ctx.writer.write_final_answer(&final_answer).await?;

        Ok(DebateResult {
            prompt: prompt_text.to_string(),
            context: context.to_vec(),
            rounds,
            synthesis: Some(synthesis),
            final_answer,
            resolution,
            convergence_reason,
        })
    }
}

/// Converged iff the set of providers present in both rounds is non-empty
/// and every one of them meets the threshold.
fn check_convergence(previous: &BTreeMap<String, LLMResponse>, current: &BTreeMap<String, LLMResponse>, threshold: f64) -> bool {
    let common: Vec<&String> = previous.keys().filter(|name| current.contains_key(*name)).collect();
    if common.is_empty() {
        return false;
    }
    common.iter().all(|name| {
        let prev = &previous[*name].content;
        let curr = &current[*name].content;
        ratio(prev, curr) >= threshold
    })
}

/// Ordered synthesis candidates: the configured `synthesis_provider` (if
/// set and present) leads, then `anthropic`, `openai` in that order if no
/// override is set, then every remaining provider in registration order.
fn synthesis_provider_order(ctx: &DebateContext) -> Vec<String> {
    let mut order = Vec::new();
    let registered: Vec<String> = ctx.registry.order().to_vec();

    if let Some(preferred) = &ctx.config.synthesis_provider {
        if registered.contains(preferred) {
            order.push(preferred.clone());
        }
    } else {
        for default in ["anthropic", "openai"] {
            if registered.iter().any(|name| name == default) {
                order.push(default.to_string());
            }
        }
    }

    for name in &registered {
        if !order.contains(name) {
            order.push(name.clone());
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenUsage;

    fn response(content: &str) -> LLMResponse {
        LLMResponse::new("p", "m", content, TokenUsage::default())
    }

    #[test]
    fn convergence_requires_every_common_provider_above_threshold() {
        let mut previous = BTreeMap::new();
        previous.insert("a".to_string(), response("The sky is blue today."));
        previous.insert("b".to_string(), response("The sky is blue today."));
        let mut current = previous.clone();
        assert!(check_convergence(&previous, &current, 0.85));

        current.insert("b".to_string(), response("Something completely different and unrelated."));
        assert!(!check_convergence(&previous, &current, 0.85));
    }

    #[test]
    fn convergence_is_false_when_no_common_providers() {
        let mut previous = BTreeMap::new();
        previous.insert("a".to_string(), response("x"));
        let mut current = BTreeMap::new();
        current.insert("b".to_string(), response("x"));
        assert!(!check_convergence(&previous, &current, 0.0));
    }
}
