//! Answer generation — the second instantiation of the structured-output
//! generator. Retrieved chunks supply locally relevant passages, the stored
//! notes supply paper-wide framing; both go into the prompt because either
//! alone misses detail.

use marginalia_llm::{GenerateError, StructuredGenerator, ToolChoice, ToolSpec};
use serde::{Deserialize, Serialize};

pub const ANSWER_TOOL_NAME: &str = "record_answers";

pub const ANSWER_PROMPT: &str = "\
You are answering a question about a research paper. Use only the excerpts
and the notes below; if they do not contain the answer, say so in the
answer. For each answer, suggest follow-up questions the excerpts could
also answer.

Relevant excerpts:
{{ paper }}

Notes on the paper:
{{ notes }}

Question: {{ question }}";

pub fn answer_tool() -> ToolSpec {
    ToolSpec {
        name: ANSWER_TOOL_NAME.to_string(),
        description: "Record answers to a question about a research paper, \
                      with follow-up questions."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "answers": {
                    "type": "array",
                    "description": "Candidate answers to the question.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "answer": {
                                "type": "string",
                                "description": "The answer, grounded in the excerpts and notes."
                            },
                            "followup_questions": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "Follow-up questions worth asking next."
                            }
                        },
                        "required": ["answer", "followup_questions"]
                    }
                }
            },
            "required": ["answers"]
        }),
    }
}

/// One generated answer candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub followup_questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AnswersPayload {
    answers: Vec<Answer>,
}

/// Generate candidate answers. Tool choice is automatic — the model may
/// decline, and a decline surfaces as a schema-validation failure rather
/// than an empty answer set.
pub async fn generate_answers(
    generator: &StructuredGenerator,
    chunk_text: &str,
    notes_text: &str,
    question: &str,
) -> Result<Vec<Answer>, GenerateError> {
    let tool = answer_tool();
    let payload: AnswersPayload = generator
        .generate(
            ANSWER_PROMPT,
            minijinja::context! {
                paper => chunk_text,
                notes => notes_text,
                question => question,
            },
            &tool,
            ToolChoice::Auto,
        )
        .await?;
    Ok(payload.answers)
}
