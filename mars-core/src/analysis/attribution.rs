//! Attribution analysis: contribution, survival, influence, round diffs
//!
//! Every metric bottoms out in the same primitive: the sequence-matching
//! ratio between two sentences, thresholded at 0.6 (the attribution
//! threshold, distinct from the convergence threshold used during a
//! debate). Round-diff matching is resolved as a greedy one-to-one
//! pairing rather than an independent per-sentence best match, so the
//! `unchanged + removed = |from|` and `unchanged + added = |to|`
//! invariants hold exactly; contribution matching is independent
//! per-sentence, as the spec's per-sentence wording requires.

use std::collections::BTreeMap;

use crate::analysis::sentences;
use crate::analysis::similarity::ratio;
use crate::types::{AttributionReport, DebateResult, ProviderAttribution, RoundDiff};

const ATTRIBUTION_THRESHOLD: f64 = 0.6;

struct CorpusSentence<'a> {
    provider: &'a str,
    text: &'a str,
}

/// Analyze attribution over a finished debate. `provider_order` is the
/// registration order used to break ties in best-match lookups.
pub fn analyze_attribution(result: &DebateResult, provider_order: &[String]) -> AttributionReport {
    let final_sentences = sentences::extract(&result.final_answer);

    let mut corpus: Vec<CorpusSentence> = Vec::new();
    // Owned sentence storage lives separately so CorpusSentence can borrow text.
    let mut owned_sentences: Vec<(String, String)> = Vec::new();
    for round in &result.rounds {
        for (provider, response) in &round.answers {
            for sentence in sentences::extract(&response.content) {
                owned_sentences.push((provider.clone(), sentence));
            }
        }
        for (provider, response) in &round.critiques {
            for sentence in sentences::extract(&response.content) {
                owned_sentences.push((provider.clone(), sentence));
            }
        }
    }
    for (provider, text) in &owned_sentences {
        corpus.push(CorpusSentence { provider, text });
    }

    let mut contribution_counts: BTreeMap<&str, usize> = provider_order.iter().map(|p| (p.as_str(), 0)).collect();
    let mut novel_count = 0usize;

    for sentence in &final_sentences {
        match best_match(sentence, &corpus, provider_order) {
            Some(provider) => *contribution_counts.entry(provider).or_insert(0) += 1,
            None => novel_count += 1,
        }
    }

    let total_final = final_sentences.len();
    let mut attributions = Vec::new();
    for provider in provider_order {
        let contribution = ratio_of(contribution_counts.get(provider.as_str()).copied().unwrap_or(0), total_final);
        let survival = compute_survival(result, provider, &final_sentences);
        let influence = compute_influence(result, provider);
        let novel_in_synthesis = ratio_of(novel_count, total_final);
        attributions.push(ProviderAttribution {
            provider: provider.clone(),
            contribution,
            survival,
            influence,
            novel_in_synthesis,
        });
    }

    let round_diffs = compute_round_diffs(result, provider_order);

    AttributionReport {
        attributions,
        round_diffs,
        novel_in_synthesis: ratio_of(novel_count, total_final),
    }
}

fn ratio_of(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Highest-ratio corpus sentence for `sentence`, broken by `provider_order`
/// on ties. Returns `None` if nothing clears the attribution threshold.
fn best_match<'a>(sentence: &str, corpus: &[CorpusSentence<'a>], provider_order: &[String]) -> Option<&'a str> {
    let mut best: Option<(f64, usize, &str)> = None;
    for candidate in corpus {
        let score = ratio(sentence, candidate.text);
        if score < ATTRIBUTION_THRESHOLD {
            continue;
        }
        let provider_rank = provider_order.iter().position(|p| p == candidate.provider).unwrap_or(usize::MAX);
        let better = match &best {
            None => true,
            Some((best_score, best_rank, _)) => score > *best_score || (score == *best_score && provider_rank < *best_rank),
        };
        if better {
            best = Some((score, provider_rank, candidate.provider));
        }
    }
    best.map(|(_, _, provider)| provider)
}

fn compute_survival(result: &DebateResult, provider: &str, final_sentences: &[String]) -> f64 {
    let Some(round_one) = result.round(1) else {
        return 0.0;
    };
    let Some(response) = round_one.answers.get(provider) else {
        return 0.0;
    };
    let round_one_sentences = sentences::extract(&response.content);
    if round_one_sentences.is_empty() {
        return 0.0;
    }
    let survived = round_one_sentences
        .iter()
        .filter(|s| final_sentences.iter().any(|f| ratio(s, f) >= ATTRIBUTION_THRESHOLD))
        .count();
    survived as f64 / round_one_sentences.len() as f64
}

fn compute_influence(result: &DebateResult, provider: &str) -> f64 {
    let mut total_sentences = 0usize;
    let mut adopted = 0usize;

    for round in &result.rounds {
        if let Some(response) = round.answers.get(provider) {
            total_sentences += sentences::extract(&response.content).len();
        }
    }
    if total_sentences == 0 {
        return 0.0;
    }

    for window in result.rounds.windows(2) {
        let (current, next) = (&window[0], &window[1]);
        let Some(p_response) = current.answers.get(provider) else {
            continue;
        };
        let p_sentences = sentences::extract(&p_response.content);

        for (other, next_response) in &next.answers {
            if other == provider {
                continue;
            }
            let other_prev_sentences = current.answers.get(other).map(|r| sentences::extract(&r.content)).unwrap_or_default();
            let other_next_sentences = sentences::extract(&next_response.content);

            let newly_appeared = other_next_sentences
                .iter()
                .filter(|s| !other_prev_sentences.iter().any(|prev| ratio(s, prev) >= ATTRIBUTION_THRESHOLD));

            for new_sentence in newly_appeared {
                if p_sentences.iter().any(|p| ratio(p, new_sentence) >= ATTRIBUTION_THRESHOLD) {
                    adopted += 1;
                }
            }
        }
    }

    (adopted as f64 / total_sentences as f64).min(1.0)
}

fn compute_round_diffs(result: &DebateResult, provider_order: &[String]) -> Vec<RoundDiff> {
    let mut diffs = Vec::new();
    for provider in provider_order {
        for window in result.rounds.windows(2) {
            let (from, to) = (&window[0], &window[1]);
            let Some(from_response) = from.answers.get(provider) else {
                continue;
            };
            let Some(to_response) = to.answers.get(provider) else {
                continue;
            };

            let from_sentences = sentences::extract(&from_response.content);
            let to_sentences = sentences::extract(&to_response.content);

            let similarity = ratio(&from_sentences.join(" "), &to_sentences.join(" "));
            let (unchanged, removed, added) = greedy_match_counts(&from_sentences, &to_sentences);

            diffs.push(RoundDiff {
                provider: provider.clone(),
                from_round: from.round,
                to_round: to.round,
                similarity,
                sentences_added: added,
                sentences_removed: removed,
                sentences_unchanged: unchanged,
            });
        }
    }
    diffs
}

/// Greedy one-to-one pairing between `from` and `to` sentences, highest
/// ratio first, so `unchanged + removed = from.len()` and
/// `unchanged + added = to.len()` hold exactly.
fn greedy_match_counts(from: &[String], to: &[String]) -> (usize, usize, usize) {
    let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
    for (i, f) in from.iter().enumerate() {
        for (j, t) in to.iter().enumerate() {
            let score = ratio(f, t);
            if score >= ATTRIBUTION_THRESHOLD {
                pairs.push((score, i, j));
            }
        }
    }
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

    let mut from_used = vec![false; from.len()];
    let mut to_used = vec![false; to.len()];
    let mut unchanged = 0;
    for (_, i, j) in pairs {
        if !from_used[i] && !to_used[j] {
            from_used[i] = true;
            to_used[j] = true;
            unchanged += 1;
        }
    }

    let removed = from.len() - unchanged;
    let added = to.len() - unchanged;
    (unchanged, removed, added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DebateRound, LLMResponse, TokenUsage};

    fn response(provider: &str, content: &str) -> LLMResponse {
        LLMResponse::new(provider, "test-model", content, TokenUsage::default())
    }

    #[test]
    fn attribution_sums_to_one_with_novel_in_synthesis() {
        let mut round1 = DebateRound::new(1);
        round1.answers.insert(
            "a".into(),
            response("a", "The sky is blue today because of light scattering. Oceans look blue for a similar reason."),
        );
        round1.answers.insert("b".into(), response("b", "Grass is green due to chlorophyll absorption of light."));

        let result = DebateResult {
            prompt: "why are things colored the way they are".into(),
            context: vec![],
            rounds: vec![round1],
            synthesis: None,
            final_answer: "The sky is blue today because of light scattering. \
                Oceans look blue for a similar reason. \
                Grass is green due to chlorophyll absorption of light. \
                Completely unrelated statement about baking bread at home."
                .into(),
            resolution: String::new(),
            convergence_reason: "max rounds".into(),
        };

        let order = vec!["a".to_string(), "b".to_string()];
        let report = analyze_attribution(&result, &order);

        let total: f64 = report.attributions.iter().map(|a| a.contribution).sum::<f64>() + report.novel_in_synthesis;
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn round_diff_invariants_hold() {
        let mut round1 = DebateRound::new(1);
        round1.answers.insert("a".into(), response("a", "This is the first sentence from round one here. This one stays unchanged across rounds."));
        let mut round2 = DebateRound::new(2);
        round2.answers.insert("a".into(), response("a", "This one stays unchanged across rounds. This is a brand new sentence added in round two."));

        let result = DebateResult {
            prompt: "p".into(),
            context: vec![],
            rounds: vec![round1, round2],
            synthesis: None,
            final_answer: String::new(),
            resolution: String::new(),
            convergence_reason: "max rounds".into(),
        };

        let order = vec!["a".to_string()];
        let diffs = compute_round_diffs(&result, &order);
        assert_eq!(diffs.len(), 1);
        let diff = &diffs[0];
        assert_eq!(diff.sentences_unchanged + diff.sentences_removed, 2);
        assert_eq!(diff.sentences_unchanged + diff.sentences_added, 2);
    }

    #[test]
    fn survival_is_zero_when_provider_absent_from_round_one() {
        let result = DebateResult {
            prompt: "p".into(),
            context: vec![],
            rounds: vec![DebateRound::new(1)],
            synthesis: None,
            final_answer: String::new(),
            resolution: String::new(),
            convergence_reason: "max rounds".into(),
        };
        assert_eq!(compute_survival(&result, "ghost", &[]), 0.0);
    }
}
