//! Strategy selection and post-run analysis
//!
//! The engine is deliberately thin: pick a [`Strategy`] from
//! [`DebateConfig::mode`], run it, and — only if it produced a result —
//! run the two analyzers over the finished transcript. Analysis never
//! runs on a failed debate; there is nothing to attribute or cost.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analysis::{analyze_attribution, analyze_cost};
use crate::config::{DebateConfig, Mode};
use crate::error::Result;
use crate::provider::Registry;
use crate::render::Renderer;
use crate::strategy::{DebateContext, JudgeStrategy, RoundRobinStrategy, Strategy};
use crate::types::{AttributionReport, CostReport, DebateResult};
use crate::writer::AuditWriter;

/// A completed run: the debate transcript plus both analysis reports.
#[derive(Debug)]
pub struct RunOutcome {
    pub result: DebateResult,
    pub attribution: AttributionReport,
    pub cost: CostReport,
}

/// Run a full debate: dispatch to the configured strategy, then analyze.
pub async fn run(config: DebateConfig, registry: Registry, renderer: Arc<dyn Renderer>, writer: Arc<AuditWriter>, prompt: &str, context: &[String]) -> Result<RunOutcome> {
    config.validate()?;

    let provider_order = registry.order().to_vec();
    let models: BTreeMap<String, String> = provider_order
        .iter()
        .filter_map(|name| registry.get(name).map(|p| (name.clone(), config.model_overrides.get(name).cloned().unwrap_or_else(|| p.default_model().to_string()))))
        .collect();

    let strategy: Box<dyn Strategy> = match config.mode {
        Mode::RoundRobin => Box::new(RoundRobinStrategy),
        Mode::Judge => Box::new(JudgeStrategy),
    };

    let ctx = DebateContext { registry, config, renderer, writer };
    ctx.writer.write_prompt_and_context(prompt, context).await?;
    let result = strategy.run(&ctx, prompt, context).await?;

    let attribution = analyze_attribution(&result, &provider_order);
    let cost = analyze_cost(&result, &models);

    ctx.writer.write_attribution(&attribution).await?;
    ctx.writer.write_round_diffs(&attribution.round_diffs).await?;
    ctx.writer.write_costs(&cost).await?;

    Ok(RunOutcome { result, attribution, cost })
}
