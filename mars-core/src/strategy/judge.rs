//! Judge strategy: one initial round, then a single ruling
//!
//! No fallback: if the judge call fails after retry exhaustion, the run
//! fails outright. This is the strategy's entire reason to exist — a
//! cheaper alternative to round-robin's multi-round critique loop when a
//! single designated evaluator is trusted to pick a winner.

use async_trait::async_trait;

use crate::error::{Result, RunError};
use crate::prompt;
use crate::types::{DebateResult, DebateRound};

use super::{dispatch_round, DebateContext, Strategy};

pub struct JudgeStrategy;

#[async_trait]
impl Strategy for JudgeStrategy {
    async fn run(&self, ctx: &DebateContext, prompt_text: &str, context: &[String]) -> Result<DebateResult> {
        let provider_names = ctx.config.providers.clone();

        ctx.renderer.round_started(1, 1);
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

        let judge_name = ctx.config.judge_provider.clone().ok_or(RunError::JudgeFailed("no judge_provider configured".to_string()))?;
        let judge = ctx.registry.get(&judge_name).ok_or_else(|| RunError::JudgeFailed(format!("judge provider '{judge_name}' not registered")))?;

        ctx.renderer.synthesis_attempt(&judge_name);
        let messages = prompt::build_judge(prompt_text, &round.answers);
        let model = ctx.config.model_overrides.get(&judge_name).cloned();
        let judgement = judge
            .generate(&messages, model.as_deref(), ctx.config.max_tokens, ctx.config.temperature)
            .await
            .map_err(|e| RunError::JudgeFailed(e.to_string()))?;

        let model_name = model.unwrap_or_else(|| judge.default_model().to_string());
        let content = judgement.0;
        let usage = judgement.1;
        let (resolution, final_answer) = prompt::split_final_answer(&content);

        ctx.writer.write_resolution(&resolution).await?;
        ctx.writer.write_final_answer(&final_answer).await?;

        Ok(DebateResult {
            prompt: prompt_text.to_string(),
            context: context.to_vec(),
            rounds: vec![round],
            synthesis: Some(crate::types::LLMResponse::new(judge_name, model_name, content, usage)),
            final_answer,
            resolution,
            convergence_reason: "judge ruling".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::split_final_answer;

    #[test]
    fn judge_response_splits_on_final_answer_heading() {
        let content = "reasoning\n## Final Answer\nGo with X.";
        let (resolution, answer) = split_final_answer(content);
        assert_eq!(resolution, "reasoning");
        assert_eq!(answer, "Go with X.");
    }
}
