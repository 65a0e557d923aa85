//! End-to-end debate scenarios over fake, in-memory providers.
//!
//! No real HTTP calls happen here; each fake provider answers from a
//! scripted queue of outcomes so the orchestration logic (fan-out,
//! convergence, synthesis fallback, attribution arithmetic) can be
//! exercised deterministically.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mars_core::config::{DebateConfig, Mode};
use mars_core::provider::{Provider, ProviderError, Registry};
use mars_core::render::NullRenderer;
use mars_core::types::TokenUsage;
use mars_core::writer::AuditWriter;

/// A provider whose `generate` outcomes are scripted call-by-call; once the
/// queue is exhausted it repeats the last outcome.
#[derive(Debug)]
struct FakeProvider {
    name: String,
    model: String,
    outcomes: Mutex<Vec<Result<&'static str, ProviderError>>>,
}

impl FakeProvider {
    fn new(name: &str, outcomes: Vec<Result<&'static str, ProviderError>>) -> Self {
        Self {
            name: name.to_string(),
            model: format!("{name}-model"),
            outcomes: Mutex::new(outcomes),
        }
    }

    fn always(name: &str, content: &'static str) -> Self {
        Self::new(name, vec![Ok(content)])
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, _messages: &[mars_core::types::Message], _model: Option<&str>, _max_tokens: usize, _temperature: Option<f32>) -> Result<(String, TokenUsage), ProviderError> {
        let mut outcomes = self.outcomes.lock().unwrap();
        let next = if outcomes.len() > 1 { outcomes.remove(0) } else { outcomes[0].clone() };
        next.map(|content| (content.to_string(), TokenUsage::new(10, 20)))
    }
}

async fn registry_of(providers: Vec<(&str, Arc<dyn Provider>)>) -> Registry {
    let mut registry = Registry::new();
    for (name, provider) in providers {
        registry.insert(name.to_string(), provider);
    }
    registry
}

fn base_config(providers: &[&str], rounds: usize, threshold: f64) -> DebateConfig {
    DebateConfig {
        providers: providers.iter().map(|s| s.to_string()).collect(),
        model_overrides: HashMap::new(),
        mode: Mode::RoundRobin,
        rounds,
        judge_provider: None,
        synthesis_provider: None,
        threshold,
        max_tokens: 1024,
        temperature: None,
        max_retries: 2,
        output_dir: PathBuf::from("/tmp"),
        verbose: false,
    }
}

async fn writer() -> (tempfile::TempDir, Arc<AuditWriter>) {
    let dir = tempfile::tempdir().unwrap();
    let w = AuditWriter::create(dir.path(), "20260101T000000Z", "scenario").await.unwrap();
    (dir, Arc::new(w))
}

#[tokio::test]
async fn two_providers_converge_at_round_two() {
    let a: Arc<dyn Provider> = Arc::new(FakeProvider::always("anthropic", "The sky is blue today."));
    let b: Arc<dyn Provider> = Arc::new(FakeProvider::always("openai", "The sky is blue today."));
    let registry = registry_of(vec![("anthropic", a), ("openai", b)]).await;
    let config = base_config(&["anthropic", "openai"], 3, 0.85);
    let (_dir, writer) = writer().await;

    let outcome = mars_core::run(config, registry, Arc::new(NullRenderer), writer, "what color is the sky?", &[]).await.unwrap();

    assert_eq!(outcome.result.rounds.len(), 2);
    assert!(outcome.result.convergence_reason.contains("round 2"));
    assert!(outcome.result.convergence_reason.contains("0.85"));
    assert!(!outcome.result.final_answer.is_empty());
}

#[tokio::test]
async fn one_provider_fails_permanently() {
    let a: Arc<dyn Provider> = Arc::new(FakeProvider::always("anthropic", "Paris is the capital of France."));
    let b: Arc<dyn Provider> = Arc::new(FakeProvider::always("openai", "France's capital is Paris."));
    let c: Arc<dyn Provider> = Arc::new(FakeProvider::new("google", vec![Err(ProviderError::Authentication("bad key".into()))]));
    let registry = registry_of(vec![("anthropic", a), ("openai", b), ("google", c)]).await;
    let config = base_config(&["anthropic", "openai", "google"], 1, 0.85);
    let (_dir, writer) = writer().await;

    let outcome = mars_core::run(config, registry, Arc::new(NullRenderer), writer, "what is the capital of France?", &[]).await.unwrap();

    let round1 = &outcome.result.rounds[0];
    assert!(round1.answers.contains_key("anthropic"));
    assert!(round1.answers.contains_key("openai"));
    assert!(!round1.answers.contains_key("google"));

    let google_attribution = outcome.attribution.attributions.iter().find(|a| a.provider == "google");
    assert!(google_attribution.is_none() || google_attribution.unwrap().contribution == 0.0);
}

#[tokio::test]
async fn synthesis_falls_back_to_openai_when_anthropic_fails() {
    let a: Arc<dyn Provider> = Arc::new(FakeProvider::new(
        "anthropic",
        vec![Ok("Anthropic's initial answer."), Err(ProviderError::Other("synthesis broke".into()))],
    ));
    let b: Arc<dyn Provider> = Arc::new(FakeProvider::new("openai", vec![Ok("OpenAI's initial answer."), Ok("reasoning\n## Final Answer\nUse openai's synthesis.")]));
    let registry = registry_of(vec![("anthropic", a), ("openai", b)]).await;
    let config = base_config(&["anthropic", "openai"], 1, 0.85);
    let (_dir, writer) = writer().await;

    let outcome = mars_core::run(config, registry, Arc::new(NullRenderer), writer, "pick an approach", &[]).await.unwrap();

    let synthesis = outcome.result.synthesis.expect("synthesis should be present");
    assert_eq!(synthesis.provider, "openai");
    assert_eq!(outcome.result.final_answer, "Use openai's synthesis.");
}

#[tokio::test]
async fn all_providers_fail_during_synthesis_exhausts_run() {
    let a: Arc<dyn Provider> = Arc::new(FakeProvider::new(
        "anthropic",
        vec![Ok("Anthropic's initial answer."), Err(ProviderError::Other("down".into()))],
    ));
    let b: Arc<dyn Provider> = Arc::new(FakeProvider::new("openai", vec![Ok("OpenAI's initial answer."), Err(ProviderError::Other("also down".into()))]));
    let registry = registry_of(vec![("anthropic", a), ("openai", b)]).await;
    let config = base_config(&["anthropic", "openai"], 1, 0.85);
    let (dir, writer) = writer().await;

    let err = mars_core::run(config, registry, Arc::new(NullRenderer), writer, "pick an approach", &[]).await.unwrap_err();
    assert!(matches!(err, mars_core::RunError::SynthesisExhausted { .. }));

    let run_dir = dir.path().join("20260101T000000Z_scenario");
    assert!(run_dir.join("audit").join("01-round-1-responses.md").exists());
    assert!(!run_dir.join("final-answer.md").exists());
}

#[tokio::test]
async fn judge_mode_splits_resolution_from_final_answer() {
    let a: Arc<dyn Provider> = Arc::new(FakeProvider::always("anthropic", "Option A is safer."));
    let b: Arc<dyn Provider> = Arc::new(FakeProvider::always("openai", "Option B is faster."));
    let judge: Arc<dyn Provider> = Arc::new(FakeProvider::always("google", "reasoning\n## Final Answer\nGo with X."));
    let registry = registry_of(vec![("anthropic", a), ("openai", b), ("google", judge)]).await;

    let mut config = base_config(&["anthropic", "openai", "google"], 1, 0.85);
    config.mode = Mode::Judge;
    config.judge_provider = Some("google".to_string());
    let (_dir, writer) = writer().await;

    let outcome = mars_core::run(config, registry, Arc::new(NullRenderer), writer, "which option?", &[]).await.unwrap();

    assert_eq!(outcome.result.resolution, "reasoning");
    assert_eq!(outcome.result.final_answer, "Go with X.");
    assert_eq!(outcome.result.convergence_reason, "judge ruling");
}

#[tokio::test]
async fn attribution_arithmetic_matches_the_canonical_four_sentence_example() {
    use mars_core::analysis::analyze_attribution;
    use mars_core::types::{DebateResult, DebateRound, LLMResponse};

    let long_a1 = "Renewable energy reduces long-term operating costs significantly.";
    let long_a2 = "Battery storage is essential for managing supply variability.";
    let long_b1 = "Government incentives accelerate renewable adoption nationwide.";
    let novel = "Completely unrelated musings about medieval architecture history.";

    let mut round1 = DebateRound::new(1);
    round1.answers.insert("a".to_string(), LLMResponse::new("a", "m", format!("{long_a1} {long_a2}"), TokenUsage::default()));
    round1.answers.insert("b".to_string(), LLMResponse::new("b", "m", long_b1.to_string(), TokenUsage::default()));

    let final_answer = format!("{long_a1} {long_a2} {long_b1} {novel}");

    let result = DebateResult {
        prompt: "energy policy".to_string(),
        context: vec![],
        rounds: vec![round1],
        synthesis: Some(LLMResponse::new("synth", "m", final_answer.clone(), TokenUsage::default())),
        final_answer,
        resolution: String::new(),
        convergence_reason: "max rounds".to_string(),
    };

    let report = analyze_attribution(&result, &["a".to_string(), "b".to_string()]);
    let a = report.attributions.iter().find(|p| p.provider == "a").unwrap();
    let b = report.attributions.iter().find(|p| p.provider == "b").unwrap();

    assert!((a.contribution - 0.5).abs() < 1e-6);
    assert!((b.contribution - 0.25).abs() < 1e-6);
    assert!((report.novel_in_synthesis - 0.25).abs() < 1e-6);

    let sum = a.contribution + b.contribution + report.novel_in_synthesis;
    assert!((sum - 1.0).abs() < 1e-6);
}
