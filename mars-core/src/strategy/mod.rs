//! Debate strategies
//!
//! Round-robin and judge share everything except how they turn initial
//! answers into a final one; that's modeled as two implementations of the
//! [`Strategy`] capability rather than a shared base class with
//! overridden methods.

pub mod judge;
pub mod round_robin;

pub use judge::JudgeStrategy;
pub use round_robin::RoundRobinStrategy;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;

use crate::config::DebateConfig;
use crate::error::Result;
use crate::provider::{Registry, StreamEvent};
use crate::render::Renderer;
use crate::types::{DebateResult, LLMResponse, Message};
use crate::writer::AuditWriter;

/// State shared by every strategy: the constructed providers, the run's
/// configuration, and the two single-writer sinks.
pub struct DebateContext {
    pub registry: Registry,
    pub config: DebateConfig,
    pub renderer: Arc<dyn Renderer>,
    pub writer: Arc<AuditWriter>,
}

/// A debate strategy turns a prompt into a finished [`DebateResult`].
#[async_trait]
pub trait Strategy: Send + Sync {
    async fn run(&self, ctx: &DebateContext, prompt: &str, context: &[String]) -> Result<DebateResult>;
}

/// Dispatch one call per provider in `names`, building each provider's
/// prompt from `build_prompt`. Quiet mode fans out concurrently; verbose
/// mode dispatches sequentially and streams text through the renderer so
/// output from different providers is never interleaved.
///
/// Providers that fail are logged and simply absent from the returned map;
/// this function never itself returns an error.
pub(crate) async fn dispatch_round<F>(ctx: &DebateContext, names: &[String], round: usize, build_prompt: F) -> BTreeMap<String, LLMResponse>
where
    F: Fn(&str) -> Vec<Message>,
{
    if ctx.config.verbose {
        dispatch_sequential(ctx, names, round, build_prompt).await
    } else {
        dispatch_parallel(ctx, names, round, build_prompt).await
    }
}

async fn dispatch_parallel<F>(ctx: &DebateContext, names: &[String], round: usize, build_prompt: F) -> BTreeMap<String, LLMResponse>
where
    F: Fn(&str) -> Vec<Message>,
{
    let calls = names.iter().filter_map(|name| {
        let provider = ctx.registry.get(name)?.clone();
        let messages = build_prompt(name);
        let model = ctx.config.model_overrides.get(name).cloned();
        let max_tokens = ctx.config.max_tokens;
        let temperature = ctx.config.temperature;
        let name = name.clone();
        Some(async move {
            let result = provider.generate(&messages, model.as_deref(), max_tokens, temperature).await;
            (name, provider.default_model().to_string(), model, result)
        })
    });

    let results = futures::future::join_all(calls).await;
    collect_results(ctx, round, results)
}

async fn dispatch_sequential<F>(ctx: &DebateContext, names: &[String], round: usize, build_prompt: F) -> BTreeMap<String, LLMResponse>
where
    F: Fn(&str) -> Vec<Message>,
{
    let mut results = Vec::new();
    for name in names {
        let Some(provider) = ctx.registry.get(name).cloned() else {
            continue;
        };
        let messages = build_prompt(name);
        let model = ctx.config.model_overrides.get(name).cloned();
        let max_tokens = ctx.config.max_tokens;
        let temperature = ctx.config.temperature;

        let outcome = match provider.stream(&messages, model.as_deref(), max_tokens, temperature).await {
            Ok(mut stream) => {
                let mut content = String::new();
                let mut usage = crate::types::TokenUsage::default();
                let mut failed = None;
                while let Some(event) = stream.next().await {
                    match event {
                        Ok(StreamEvent::TextDelta(delta)) => {
                            ctx.renderer.text_delta(name, &delta);
                            content.push_str(&delta);
                        }
                        Ok(StreamEvent::Done { usage: final_usage }) => usage = final_usage,
                        Err(e) => {
                            failed = Some(e);
                            break;
                        }
                    }
                }
                match failed {
                    Some(e) => Err(e),
                    None => Ok((content, usage)),
                }
            }
            Err(e) => Err(e),
        };
        results.push((name.clone(), provider.default_model().to_string(), model, outcome));
    }
    collect_results(ctx, round, results)
}

fn collect_results(
    ctx: &DebateContext,
    round: usize,
    results: Vec<(String, String, Option<String>, std::result::Result<(String, crate::types::TokenUsage), crate::provider::ProviderError>)>,
) -> BTreeMap<String, LLMResponse> {
    let mut answers = BTreeMap::new();
    for (name, default_model, model_override, outcome) in results {
        match outcome {
            Ok((content, usage)) => {
                let model = model_override.unwrap_or(default_model);
                answers.insert(name.clone(), LLMResponse::new(name, model, content, usage));
            }
            Err(e) => ctx.renderer.provider_failed(&name, round, &e.to_string()),
        }
    }
    answers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DebateConfig, Mode};
    use crate::provider::Registry;
    use crate::render::NullRenderer;
    use crate::writer::AuditWriter;
    use std::path::PathBuf;

    pub(crate) fn test_config(verbose: bool) -> DebateConfig {
        DebateConfig {
            providers: vec![],
            model_overrides: Default::default(),
            mode: Mode::RoundRobin,
            rounds: 2,
            judge_provider: None,
            synthesis_provider: None,
            threshold: 0.85,
            max_tokens: 1024,
            temperature: None,
            max_retries: 2,
            output_dir: PathBuf::from("/tmp"),
            verbose,
        }
    }

    #[tokio::test]
    async fn dispatch_round_on_empty_registry_returns_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AuditWriter::create(dir.path(), "ts", "slug").await.unwrap();
        let ctx = DebateContext {
            registry: Registry::new(),
            config: test_config(false),
            renderer: Arc::new(NullRenderer),
            writer: Arc::new(writer),
        };
        let names = vec!["anthropic".to_string()];
        let answers = dispatch_round(&ctx, &names, 1, |_| vec![Message::user("hi")]).await;
        assert!(answers.is_empty());
    }
}
