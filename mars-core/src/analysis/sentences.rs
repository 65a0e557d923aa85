//! Sentence extraction for attribution
//!
//! Splits on `.`, `!`, or `?` followed by whitespace or end-of-string.
//! Fragments shorter than 20 characters after trimming are discarded —
//! they are too short to carry attribution signal and would otherwise
//! dominate the match count with noise.

const MIN_SENTENCE_LEN: usize = 20;

/// Extract trimmed sentences of at least [`MIN_SENTENCE_LEN`] characters.
pub fn extract(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let next_is_boundary = chars.get(i + 1).map(|n| n.is_whitespace()).unwrap_or(true);
            if next_is_boundary {
                push_if_long_enough(&mut sentences, current.trim());
                current.clear();
            }
        }
    }
    push_if_long_enough(&mut sentences, current.trim());

    sentences
}

fn push_if_long_enough(sentences: &mut Vec<String>, candidate: &str) {
    if candidate.chars().count() >= MIN_SENTENCE_LEN {
        sentences.push(candidate.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminators_followed_by_whitespace() {
        let text = "This is the first sentence here. This is the second sentence here!";
        let sentences = extract(text);
        assert_eq!(sentences.len(), 2);
    }

    #[test]
    fn discards_short_fragments() {
        let text = "Ok. This is a genuinely long enough sentence to keep.";
        let sentences = extract(text);
        assert_eq!(sentences, vec!["This is a genuinely long enough sentence to keep.".to_string()]);
    }

    #[test]
    fn final_sentence_without_terminator_is_kept_if_long_enough() {
        let text = "This sentence has no terminator at the end and is quite long";
        let sentences = extract(text);
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn terminator_mid_abbreviation_without_trailing_space_does_not_split() {
        let text = "This mentions e.g.this as one run-on without any spaces after periods at all";
        let sentences = extract(text);
        assert_eq!(sentences.len(), 1);
    }
}
