//! LLM backend trait and the OpenAI implementation.
//!
//! The backend exposes two operations:
//!   chat  — a single chat completion with declared tools; the response is
//!           either tool calls with JSON arguments or a plain reply
//!   embed — batch text embeddings for the vector index

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String, // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A declared structured-output contract: the model must answer by calling
/// this function with arguments matching `parameters` (a JSON schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    /// Wire format for the OpenAI `tools` array.
    pub fn to_openai(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Tool-selection policy: `Auto` lets the model decline the tool,
/// `Forced` names the tool it must call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolChoice {
    Auto,
    Forced(String),
}

impl ToolChoice {
    fn to_openai(&self) -> serde_json::Value {
        match self {
            ToolChoice::Auto => serde_json::json!("auto"),
            ToolChoice::Forced(name) => serde_json::json!({
                "type": "function",
                "function": { "name": name }
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub tool_choice: ToolChoice,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct ToolCall {
    pub name: String,
    /// Raw JSON arguments, validated downstream against the declared schema.
    pub arguments: String,
}

/// What the model actually did with the request.
#[derive(Debug, Clone)]
pub enum ChatOutcome {
    ToolCalls(Vec<ToolCall>),
    Reply(String),
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn chat(&self, req: ChatRequest) -> Result<ChatOutcome, LlmError>;
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
    fn model_id(&self) -> &str;
}

// ── Helpers ───────────────────────────────────────────────────────────────────

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await?;
    if status >= 400 {
        let msg = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .unwrap_or("unknown API error")
            .to_string();
        return Err(LlmError::ApiError {
            status,
            message: msg,
        });
    }
    Ok(body)
}

fn parse_chat_outcome(json: &serde_json::Value) -> ChatOutcome {
    let message = &json["choices"][0]["message"];
    let calls: Vec<ToolCall> = message["tool_calls"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|c| {
                    let func = &c["function"];
                    Some(ToolCall {
                        name: func["name"].as_str()?.to_string(),
                        arguments: func["arguments"].as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    if calls.is_empty() {
        ChatOutcome::Reply(message["content"].as_str().unwrap_or("").to_string())
    } else {
        ChatOutcome::ToolCalls(calls)
    }
}

// ── OpenAI ────────────────────────────────────────────────────────────────────

pub struct OpenAiBackend {
    pub model: String,
    pub embedding_model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn chat(&self, req: ChatRequest) -> Result<ChatOutcome, LlmError> {
        let tools: Vec<serde_json::Value> = req.tools.iter().map(ToolSpec::to_openai).collect();
        let body = serde_json::json!({
            "model":       &self.model,
            "messages":    req.messages,
            "temperature": req.temperature,
            "tools":       tools,
            "tool_choice": req.tool_choice.to_openai(),
        });
        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;
        Ok(parse_chat_outcome(&json))
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = serde_json::json!({
            "model": &self.embedding_model,
            "input": texts,
        });
        let resp = self
            .client
            .post("https://api.openai.com/v1/embeddings")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;

        #[derive(Deserialize)]
        struct EmbeddingRow {
            embedding: Vec<f32>,
        }
        #[derive(Deserialize)]
        struct EmbeddingResponse {
            data: Vec<EmbeddingRow>,
        }
        let parsed: EmbeddingResponse = serde_json::from_value(json)?;
        Ok(parsed.data.into_iter().map(|r| r.embedding).collect())
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_defaults() {
        let b = OpenAiBackend::new("sk-test", DEFAULT_CHAT_MODEL);
        assert_eq!(b.model_id(), "gpt-4o");
        assert_eq!(b.embedding_model, "text-embedding-3-small");
    }

    #[test]
    fn test_embedding_model_override() {
        let b = OpenAiBackend::new("sk-test", "gpt-4o").with_embedding_model("text-embedding-3-large");
        assert_eq!(b.embedding_model, "text-embedding-3-large");
    }

    #[test]
    fn test_tool_spec_wire_format() {
        let tool = ToolSpec {
            name: "record_notes".to_string(),
            description: "Record notes".to_string(),
            parameters: serde_json::json!({"type": "object"}),
        };
        let wire = tool.to_openai();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "record_notes");
        assert_eq!(wire["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_tool_choice_wire_format() {
        assert_eq!(ToolChoice::Auto.to_openai(), serde_json::json!("auto"));
        let forced = ToolChoice::Forced("record_notes".to_string()).to_openai();
        assert_eq!(forced["function"]["name"], "record_notes");
    }

    #[test]
    fn test_parse_outcome_with_tool_calls() {
        let json = serde_json::json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "record_notes", "arguments": "{\"notes\":[]}" }
                    }]
                }
            }]
        });
        match parse_chat_outcome(&json) {
            ChatOutcome::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "record_notes");
            }
            ChatOutcome::Reply(_) => panic!("expected tool calls"),
        }
    }

    #[test]
    fn test_parse_outcome_plain_reply() {
        let json = serde_json::json!({
            "choices": [{ "message": { "content": "I cannot answer that." } }]
        });
        match parse_chat_outcome(&json) {
            ChatOutcome::Reply(text) => assert_eq!(text, "I cannot answer that."),
            ChatOutcome::ToolCalls(_) => panic!("expected plain reply"),
        }
    }
}
