use serde::{Deserialize, Serialize};

use crate::types::{
    HabitsOutput, IntellectOutput, MindOutput, ResponseMode, SynthesisOutput, TrainerEscalation,
};

/// Body of a chat request, streaming or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,
}

impl ChatRequest {
    /// Create a new chat request.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The complete answer to a turn, returned by the one-shot chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Output of the mind faculty.
    pub manas: MindOutput,

    /// Output of the intellect faculty.
    pub buddhi: IntellectOutput,

    /// Output of the habits faculty.
    pub sanskaras: HabitsOutput,

    /// The synthesized answer.
    pub synthesis: SynthesisOutput,

    /// Milliseconds the backend spent on the turn.
    #[serde(default)]
    pub elapsed_ms: u64,

    /// How the turn was answered; older backends omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResponseMode>,

    /// Present when the turn was escalated to the trainer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer_needed: Option<TrainerEscalation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_response_deserialization() {
        let response: ChatResponse = serde_json::from_value(json!({
            "manas": {"module": "manas", "response": "warm", "confidence": 0.8, "valence": 0.3, "metadata": {}},
            "buddhi": {"module": "buddhi", "response": "logical", "confidence": 0.6, "reasoning_chain": ["a"], "metadata": {}},
            "sanskaras": {"module": "sanskaras", "response": "usual", "confidence": 0.5, "activated_habits": [], "metadata": {}},
            "synthesis": {"response": "Hi there", "weights": {"manas": 0.35, "buddhi": 0.4, "sanskaras": 0.25}},
            "elapsed_ms": 1200
        }))
        .unwrap();
        assert_eq!(response.synthesis.response, "Hi there");
        assert_eq!(response.elapsed_ms, 1200);
        assert!(response.mode.is_none());
        assert!(response.trainer_needed.is_none());
    }

    #[test]
    fn chat_request_serialization() {
        let request = ChatRequest::new("hello");
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({"message": "hello"})
        );
    }
}
