//! Prompt construction for the four debate phases
//!
//! Every phase assembles a `Vec<Message>` ready to hand a provider. The
//! shapes differ (initial, critique, synthesis, judge) but share one
//! separator convention: synthesis and judge responses are expected to
//! contain a `## Final Answer` heading, and [`split_final_answer`] is the
//! single place that parses it.

use std::collections::BTreeMap;

use crate::types::{LLMResponse, Message};

const FINAL_ANSWER_HEADING: &str = "## Final Answer";

/// Build the initial-round prompt: the raw question, optionally preceded by
/// labelled context blocks.
pub fn build_initial(prompt: &str, context: &[String]) -> Vec<Message> {
    let mut messages = Vec::new();
    if !context.is_empty() {
        let mut system = String::from("You are participating in a multi-model debate. Use the following context:\n\n");
        for (i, block) in context.iter().enumerate() {
            system.push_str(&format!("--- Context {} ---\n{}\n\n", i + 1, block));
        }
        messages.push(Message::system(system));
    }
    messages.push(Message::user(prompt));
    messages
}

/// Build a critique prompt for `provider_name` given every provider's
/// previous-round answer. `provider_name`'s own previous answer is labelled
/// distinctly so it can revise it rather than merely react to it.
pub fn build_critique(provider_name: &str, prompt: &str, previous_answers: &BTreeMap<String, LLMResponse>) -> Vec<Message> {
    let mut body = String::from("Here are the answers from the previous round:\n\n");
    for (name, response) in previous_answers {
        let label = if name == provider_name { "Your previous answer" } else { name.as_str() };
        body.push_str(&format!("--- {} ---\n{}\n\n", label, response.content));
    }
    body.push_str("Critique the other answers, then produce your own improved answer.");

    vec![
        Message::system(format!("Original question: {}", prompt)),
        Message::user(body),
    ]
}

/// Build the synthesis prompt from every provider's latest answer.
pub fn build_synthesis(prompt: &str, latest_answers: &BTreeMap<String, LLMResponse>) -> Vec<Message> {
    let mut body = String::from("Here are the final answers from each participant:\n\n");
    for (name, response) in latest_answers {
        body.push_str(&format!("--- {} ---\n{}\n\n", name, response.content));
    }
    body.push_str(&format!(
        "Synthesise these into a single answer. First explain your reasoning for \
         how you resolved disagreements, then write the heading \"{heading}\" \
         followed by the synthesised answer.",
        heading = FINAL_ANSWER_HEADING
    ));

    vec![
        Message::system(format!("Original question: {}", prompt)),
        Message::user(body),
    ]
}

/// Build the judge prompt from every provider's initial answer.
pub fn build_judge(prompt: &str, initial_answers: &BTreeMap<String, LLMResponse>) -> Vec<Message> {
    let mut body = String::from("Here are the candidate answers:\n\n");
    for (name, response) in initial_answers {
        body.push_str(&format!("--- {} ---\n{}\n\n", name, response.content));
    }
    body.push_str(&format!(
        "Judge these answers. First explain your reasoning, then write the heading \
         \"{heading}\" followed by your ruling.",
        heading = FINAL_ANSWER_HEADING
    ));

    vec![
        Message::system(format!("Original question: {}", prompt)),
        Message::user(body),
    ]
}

/// Split a synthesis/judge response on the `## Final Answer` heading.
///
/// The match is case-sensitive and must occur at the start of a line. Only
/// the first occurrence is treated as the separator. If the heading is
/// absent, the entire text is the final answer and the resolution is empty.
pub fn split_final_answer(content: &str) -> (String, String) {
    for (byte_offset, _) in content.match_indices(FINAL_ANSWER_HEADING) {
        let at_line_start = byte_offset == 0 || content[..byte_offset].ends_with('\n');
        if at_line_start {
            let resolution = content[..byte_offset].trim().to_string();
            let final_answer = content[byte_offset + FINAL_ANSWER_HEADING.len()..].trim().to_string();
            return (resolution, final_answer);
        }
    }
    (String::new(), content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenUsage;

    #[test]
    fn split_final_answer_separates_resolution_and_answer() {
        let content = "reasoning goes here\n## Final Answer\nGo with X.";
        let (resolution, answer) = split_final_answer(content);
        assert_eq!(resolution, "reasoning goes here");
        assert_eq!(answer, "Go with X.");
    }

    #[test]
    fn split_final_answer_without_heading_is_all_final_answer() {
        let content = "just an answer, no heading";
        let (resolution, answer) = split_final_answer(content);
        assert_eq!(resolution, "");
        assert_eq!(answer, "just an answer, no heading");
    }

    #[test]
    fn split_final_answer_ignores_heading_mid_line() {
        let content = "discussing ## Final Answer as a concept\n## Final Answer\nreal answer";
        let (resolution, answer) = split_final_answer(content);
        assert_eq!(resolution, "discussing ## Final Answer as a concept");
        assert_eq!(answer, "real answer");
    }

    #[test]
    fn split_final_answer_uses_first_occurrence() {
        let content = "## Final Answer\nfirst\n## Final Answer\nsecond";
        let (resolution, answer) = split_final_answer(content);
        assert_eq!(resolution, "");
        assert_eq!(answer, "first\n## Final Answer\nsecond");
    }

    #[test]
    fn build_critique_labels_own_answer_distinctly() {
        let mut previous = BTreeMap::new();
        previous.insert(
            "anthropic".to_string(),
            LLMResponse::new("anthropic", "claude", "the sky is blue", TokenUsage::default()),
        );
        let messages = build_critique("anthropic", "what color is the sky?", &previous);
        let user_content = &messages[1].content;
        assert!(user_content.contains("Your previous answer"));
        assert!(!user_content.contains("--- anthropic ---"));
    }
}
