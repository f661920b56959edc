//! Offline token estimates for providers without a counting endpoint.
//!
//! The model id is matched against known families, each with an average
//! characters-per-token ratio. Unknown families yield `TOKENS_UNKNOWN`.

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::types::TOKENS_UNKNOWN;

const FAMILIES: &[(&str, f64)] = &[
    (r"(^|/)(gpt-4o|gpt-4\.1|gpt-5|o1|o3|o4)", 4.0),
    (r"(^|/)gpt-(3\.5|4)", 4.0),
    (r"claude", 3.5),
    (r"gemini|gemma", 4.0),
    (r"llama|mistral|mixtral|deepseek|qwen", 3.5),
];

fn families() -> &'static [(Regex, f64)] {
    static TABLE: OnceLock<Vec<(Regex, f64)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        FAMILIES
            .iter()
            .filter_map(|(pattern, ratio)| Regex::new(pattern).ok().map(|re| (re, *ratio)))
            .collect()
    })
}

/// Characters per token for `model`, if its family is known.
pub fn chars_per_token(model: &str) -> Option<f64> {
    let model = model.to_lowercase();
    families()
        .iter()
        .find(|(re, _)| re.is_match(&model))
        .map(|(_, ratio)| *ratio)
}

pub fn estimate_by_family(model: &str, prompt: &str) -> i64 {
    match chars_per_token(model) {
        Some(ratio) => (prompt.chars().count() as f64 / ratio).ceil() as i64,
        None => TOKENS_UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_families() {
        assert_eq!(chars_per_token("gpt-4o-mini"), Some(4.0));
        assert_eq!(chars_per_token("openai/o1"), Some(4.0));
        assert_eq!(chars_per_token("anthropic/claude-3.7-sonnet"), Some(3.5));
        assert_eq!(chars_per_token("google/gemini-2.5-pro"), Some(4.0));
        assert_eq!(chars_per_token("deepseek/deepseek-r1"), Some(3.5));
        assert_eq!(chars_per_token("Meta-Llama/Llama-3.3-70B"), Some(3.5));
    }

    #[test]
    fn test_unknown_family() {
        assert_eq!(chars_per_token("acme/mystery-1"), None);
        assert_eq!(estimate_by_family("acme/mystery-1", "hello"), TOKENS_UNKNOWN);
    }

    #[test]
    fn test_estimate_rounds_up() {
        // 19 chars / 4.0
        assert_eq!(estimate_by_family("gpt-4o", "Hello, how are you?"), 5);
        assert_eq!(estimate_by_family("gpt-4o", ""), 0);
        // counts chars, not bytes
        assert_eq!(estimate_by_family("gpt-4o", "éééé"), 1);
    }
}
