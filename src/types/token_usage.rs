use serde::{Deserialize, Serialize};

/// Token accounting reported by the backend when a turn finishes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens across every model call in the turn.
    #[serde(default)]
    pub input_tokens: u64,

    /// Output tokens across every model call in the turn.
    #[serde(default)]
    pub output_tokens: u64,

    /// Input tokens served from the prompt cache.
    #[serde(default)]
    pub cache_read_input_tokens: u64,

    /// Input tokens written to the prompt cache.
    #[serde(default)]
    pub cache_creation_input_tokens: u64,

    /// Input plus output tokens.
    #[serde(default)]
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Create a new `TokenUsage` with the given input and output tokens.
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn usage_deserialization() {
        let usage: TokenUsage = serde_json::from_value(json!({
            "input_tokens": 120,
            "output_tokens": 80,
            "cache_read_input_tokens": 40,
            "cache_creation_input_tokens": 0,
            "total_tokens": 200
        }))
        .unwrap();
        assert_eq!(usage.input_tokens, 120);
        assert_eq!(usage.cache_read_input_tokens, 40);
        assert_eq!(usage.total_tokens, 200);
    }

    #[test]
    fn usage_new_totals() {
        assert_eq!(TokenUsage::new(3, 4).total_tokens, 7);
    }
}
