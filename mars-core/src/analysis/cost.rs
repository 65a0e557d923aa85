//! Cost aggregation and pricing lookup
//!
//! Pricing is a static table of model-name prefixes to USD-per-million-
//! token rates. Lookup picks the **longest** matching prefix so a more
//! specific entry (`"gpt-4o-mini"`) wins over a broader one (`"gpt-4o"`)
//! when both prefix the requested model name.

use crate::types::{CostReport, DebateResult, ProviderCost};

/// (model name prefix, input $/million tokens, output $/million tokens).
const PRICING_TABLE: &[(&str, f64, f64)] = &[
    ("claude-opus-4", 15.0, 75.0),
    ("claude-sonnet-4-5", 3.0, 15.0),
    ("claude-sonnet-4", 3.0, 15.0),
    ("claude-3-5-haiku", 0.8, 4.0),
    ("claude", 3.0, 15.0),
    ("gpt-4o-mini", 0.15, 0.6),
    ("gpt-4o", 2.5, 10.0),
    ("gpt-4", 30.0, 60.0),
    ("gpt-3.5", 0.5, 1.5),
    ("gemini-1.5-pro", 1.25, 5.0),
    ("gemini-1.5-flash", 0.075, 0.3),
    ("gemini", 1.25, 5.0),
];

fn lookup_rates(model: &str) -> Option<(f64, f64)> {
    PRICING_TABLE
        .iter()
        .filter(|(prefix, _, _)| model.starts_with(prefix))
        .max_by_key(|(prefix, _, _)| prefix.len())
        .map(|(_, input, output)| (*input, *output))
}

/// Aggregate token usage and USD cost per provider across every response
/// in `result`, including synthesis/judge.
pub fn analyze_cost(result: &DebateResult, models: &std::collections::BTreeMap<String, String>) -> CostReport {
    let mut input_tokens: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    let mut output_tokens: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    let mut warnings = Vec::new();

    let mut record = |provider: &str, usage: &crate::types::TokenUsage| {
        *input_tokens.entry(provider.to_string()).or_insert(0) += usage.input_tokens;
        *output_tokens.entry(provider.to_string()).or_insert(0) += usage.output_tokens;
    };

    for round in &result.rounds {
        for response in round.answers.values() {
            record(&response.provider, &response.usage);
        }
        for response in round.critiques.values() {
            record(&response.provider, &response.usage);
        }
    }
    if let Some(synthesis) = &result.synthesis {
        record(&synthesis.provider, &synthesis.usage);
    }

    let mut providers = Vec::new();
    let mut total_cost = 0.0;

    for (provider, input) in &input_tokens {
        let output = output_tokens.get(provider).copied().unwrap_or(0);
        let model = models.get(provider).cloned().unwrap_or_default();
        let cost = match lookup_rates(&model) {
            Some((in_rate, out_rate)) => (*input as f64 / 1_000_000.0) * in_rate + (output as f64 / 1_000_000.0) * out_rate,
            None => {
                warnings.push(format!("no pricing entry for model '{model}' (provider '{provider}'); cost recorded as 0"));
                0.0
            }
        };
        total_cost += cost;
        providers.push((provider.clone(), *input, output, cost));
    }

    let provider_costs = providers
        .into_iter()
        .map(|(provider, input, output, cost)| ProviderCost {
            provider,
            input_tokens: input,
            output_tokens: output,
            usd_cost: cost,
            share_of_total: if total_cost > 0.0 { cost / total_cost } else { 0.0 },
        })
        .collect();

    CostReport {
        providers: provider_costs,
        total_usd_cost: total_cost,
        warnings,
    }
}
