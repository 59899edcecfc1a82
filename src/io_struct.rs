use serde::{Deserialize, Serialize};

pub const PROBE_MODEL: &str = "models/chat-bison-001";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Message {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MessagePrompt {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMessageRequest {
    pub model: String,
    pub temperature: f32,
    pub candidate_count: u32,
    pub prompt: MessagePrompt,
}

impl GenerateMessageRequest {
    /// The cheapest request the upstream accepts; only its success matters.
    pub fn probe() -> Self {
        GenerateMessageRequest {
            model: PROBE_MODEL.to_string(),
            temperature: 0.5,
            candidate_count: 1,
            prompt: MessagePrompt {
                messages: vec![Message {
                    content: "Hello".to_string(),
                }],
            },
        }
    }
}

/// Body returned to the caller: `{"error": false}` or `{"error": true, "msg": ...}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AuthResult {
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}
