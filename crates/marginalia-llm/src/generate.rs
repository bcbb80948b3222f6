//! Structured-output generator: render a prompt template, invoke the
//! completion backend with a declared tool schema at temperature 0, and
//! parse the tool-call arguments into typed records.
//!
//! Note generation and answer generation are both instantiations of this
//! one mechanism; they differ only in template, tool schema and target type.

use std::sync::Arc;

use minijinja::UndefinedBehavior;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::backend::{ChatOutcome, ChatRequest, LlmBackend, LlmError, Message, ToolChoice, ToolSpec};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("prompt template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("response did not match declared schema: {0}")]
    SchemaValidation(String),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Render `template` with `vars`. Rendering is pure substitution; a missing
/// variable is an error, never an empty string.
pub fn render_prompt<V: Serialize>(template: &str, vars: V) -> Result<String, GenerateError> {
    let mut env = minijinja::Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    let tmpl = env.template_from_str(template)?;
    Ok(tmpl.render(vars)?)
}

/// Extract and validate the arguments of the declared tool call.
/// A plain reply or a missing/foreign tool call fails — the caller never
/// receives a partially-filled result.
pub fn parse_tool_call<T: DeserializeOwned>(
    tool_name: &str,
    outcome: &ChatOutcome,
) -> Result<T, GenerateError> {
    match outcome {
        ChatOutcome::ToolCalls(calls) => {
            let call = calls.iter().find(|c| c.name == tool_name).ok_or_else(|| {
                GenerateError::SchemaValidation(format!(
                    "model did not call the `{tool_name}` tool"
                ))
            })?;
            serde_json::from_str(&call.arguments).map_err(|e| {
                GenerateError::SchemaValidation(format!(
                    "`{tool_name}` arguments did not conform: {e}"
                ))
            })
        }
        ChatOutcome::Reply(_) => Err(GenerateError::SchemaValidation(format!(
            "model replied in plain text instead of calling `{tool_name}`"
        ))),
    }
}

/// Reusable prompt → tool call → typed record mechanism.
#[derive(Clone)]
pub struct StructuredGenerator {
    backend: Arc<dyn LlmBackend>,
}

impl StructuredGenerator {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Generation is extraction-oriented: temperature is pinned at 0.
    pub async fn generate<T, V>(
        &self,
        template: &str,
        vars: V,
        tool: &ToolSpec,
        choice: ToolChoice,
    ) -> Result<T, GenerateError>
    where
        T: DeserializeOwned,
        V: Serialize,
    {
        let prompt = render_prompt(template, vars)?;
        debug!(
            model = self.backend.model_id(),
            tool = %tool.name,
            prompt_chars = prompt.len(),
            "dispatching structured generation"
        );

        let outcome = self
            .backend
            .chat(ChatRequest {
                messages: vec![Message::user(prompt)],
                tools: vec![tool.clone()],
                tool_choice: choice,
                temperature: 0.0,
            })
            .await?;

        parse_tool_call(&tool.name, &outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ToolCall;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct NotesPayload {
        notes: Vec<NoteRow>,
    }

    #[derive(Debug, Deserialize)]
    struct NoteRow {
        note: String,
    }

    #[test]
    fn test_render_substitutes_variables() {
        let out = render_prompt(
            "Question: {{ question }}",
            minijinja::context! { question => "What is RAG?" },
        )
        .unwrap();
        assert_eq!(out, "Question: What is RAG?");
    }

    #[test]
    fn test_render_fails_on_missing_variable() {
        let err = render_prompt("Question: {{ question }}", minijinja::context! {}).unwrap_err();
        assert!(matches!(err, GenerateError::Template(_)));
    }

    #[test]
    fn test_parse_valid_tool_call() {
        let outcome = ChatOutcome::ToolCalls(vec![ToolCall {
            name: "record_notes".to_string(),
            arguments: r#"{"notes":[{"note":"KRAS drives proliferation"}]}"#.to_string(),
        }]);
        let parsed: NotesPayload = parse_tool_call("record_notes", &outcome).unwrap();
        assert_eq!(parsed.notes.len(), 1);
        assert_eq!(parsed.notes[0].note, "KRAS drives proliferation");
    }

    #[test]
    fn test_plain_reply_is_schema_violation() {
        let outcome = ChatOutcome::Reply("here are some notes...".to_string());
        let err = parse_tool_call::<NotesPayload>("record_notes", &outcome).unwrap_err();
        assert!(matches!(err, GenerateError::SchemaValidation(_)));
    }

    #[test]
    fn test_foreign_tool_call_is_schema_violation() {
        let outcome = ChatOutcome::ToolCalls(vec![ToolCall {
            name: "something_else".to_string(),
            arguments: "{}".to_string(),
        }]);
        let err = parse_tool_call::<NotesPayload>("record_notes", &outcome).unwrap_err();
        assert!(matches!(err, GenerateError::SchemaValidation(_)));
    }

    #[test]
    fn test_missing_required_field_is_schema_violation() {
        // `note` absent inside the row — must fail, not default.
        let outcome = ChatOutcome::ToolCalls(vec![ToolCall {
            name: "record_notes".to_string(),
            arguments: r#"{"notes":[{"text":"wrong key"}]}"#.to_string(),
        }]);
        let err = parse_tool_call::<NotesPayload>("record_notes", &outcome).unwrap_err();
        assert!(matches!(err, GenerateError::SchemaValidation(_)));
    }
}
