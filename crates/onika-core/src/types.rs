//! Wire types for the two chat-completion protocols spoken by Onika's layers.
//!
//! Most providers accept the OpenAI `/chat/completions` schema. Anthropic's
//! native `/messages` API differs in both request and response shape, so it
//! gets its own pair of types. Responses are deserialized leniently: every
//! field a provider may omit is optional, and the upstream client decides
//! whether what arrived is usable.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// A chat message. Routes are single-turn, so only two roles exist.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role")]
pub enum Message {
    #[serde(rename = "system")]
    System { content: String },

    #[serde(rename = "user")]
    User { content: String },
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// OpenAI-compatible protocol
// ─────────────────────────────────────────────

/// Request body for an OpenAI-compatible chat completion API.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Raw chat completion response from an OpenAI-compatible API.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<UsageInfo>,
}

/// A single choice in a chat completion response.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message within a chat completion choice.
#[derive(Debug, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if the envelope has one.
    pub fn into_content(self) -> Option<(String, u64)> {
        let tokens = self.usage.map_or(0, |u| u.total_tokens);
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| (content, tokens))
    }
}

// ─────────────────────────────────────────────
// Anthropic Messages protocol
// ─────────────────────────────────────────────

/// Request body for Anthropic's `/messages` endpoint.
///
/// The system prompt is a top-level field instead of a message.
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Response body from Anthropic's `/messages` endpoint.
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    pub content: Vec<AnthropicBlock>,
    #[serde(default)]
    pub usage: Option<AnthropicUsage>,
}

/// One content block. Only text blocks carry an answer.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum AnthropicBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Anthropic token usage, split by direction.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AnthropicUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl AnthropicResponse {
    /// Concatenated text blocks and total token count.
    ///
    /// Returns `None` when the response has no text block at all.
    pub fn into_content(self) -> Option<(String, u64)> {
        let tokens = self
            .usage
            .map_or(0, |u| u.input_tokens + u.output_tokens);
        let texts: Vec<String> = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicBlock::Text { text } => Some(text),
                AnthropicBlock::Other => None,
            })
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some((texts.concat(), tokens))
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(vec![
            Message::system("You are ÖNIKA LI."),
            Message::user("hi"),
        ])
        .unwrap();

        assert_eq!(json[0]["role"], "system");
        assert_eq!(json[0]["content"], "You are ÖNIKA LI.");
        assert_eq!(json[1]["role"], "user");
        assert_eq!(json[1]["content"], "hi");
    }

    #[test]
    fn test_chat_request_shape() {
        let request = ChatCompletionRequest {
            model: "llama-3.3-70b-versatile".into(),
            messages: vec![Message::system("persona"), Message::user("hello")],
            temperature: 0.7,
            max_tokens: 2048,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama-3.3-70b-versatile");
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["max_tokens"], 2048);
    }

    #[test]
    fn test_chat_response_content_and_usage() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [{ "message": { "content": "🎸 hey" }, "finish_reason": "stop" }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20 }
        }))
        .unwrap();

        assert_eq!(resp.into_content(), Some(("🎸 hey".to_string(), 20)));
    }

    #[test]
    fn test_chat_response_without_usage() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "ok" } }]
        }))
        .unwrap();

        assert_eq!(resp.into_content(), Some(("ok".to_string(), 0)));
    }

    #[test]
    fn test_chat_response_empty_choices_has_no_content() {
        let resp: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(resp.into_content().is_none());
    }

    #[test]
    fn test_chat_response_null_content_has_no_content() {
        let resp: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": null } }]
        }))
        .unwrap();
        assert!(resp.into_content().is_none());
    }

    #[test]
    fn test_chat_response_missing_choices_fails_to_parse() {
        let parsed = serde_json::from_value::<ChatCompletionResponse>(json!({ "error": "nope" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_anthropic_request_puts_system_at_top_level() {
        let request = AnthropicRequest {
            model: "claude-3-5-sonnet-latest".into(),
            system: "persona".into(),
            messages: vec![Message::user("hello")],
            temperature: 0.7,
            max_tokens: 1024,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["system"], "persona");
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[test]
    fn test_anthropic_response_joins_text_blocks() {
        let resp: AnthropicResponse = serde_json::from_value(json!({
            "content": [
                { "type": "thinking", "thinking": "..." },
                { "type": "text", "text": "Rock " },
                { "type": "text", "text": "on." }
            ],
            "usage": { "input_tokens": 30, "output_tokens": 12 }
        }))
        .unwrap();

        assert_eq!(resp.into_content(), Some(("Rock on.".to_string(), 42)));
    }

    #[test]
    fn test_anthropic_response_without_text_has_no_content() {
        let resp: AnthropicResponse = serde_json::from_value(json!({
            "content": [{ "type": "tool_use", "id": "t1", "name": "x", "input": {} }]
        }))
        .unwrap();
        assert!(resp.into_content().is_none());
    }
}
