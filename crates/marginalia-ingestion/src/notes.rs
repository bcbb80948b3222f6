//! Note generation — the first instantiation of the structured-output
//! generator. The prompt carries the full extracted paper text; the tool
//! schema pins the output to an ordered list of `{note}` records.

use marginalia_llm::{GenerateError, StructuredGenerator, ToolChoice, ToolSpec};
use marginalia_store::PaperNote;
use serde::Deserialize;

pub const NOTE_TOOL_NAME: &str = "record_notes";

pub const NOTE_PROMPT: &str = "\
You are a meticulous research assistant. Take notes on the following paper.
Record each key contribution, method, quantitative result, dataset and
limitation as its own note. A note must stand on its own: a reader without
the paper should still understand it. Do not editorialize.

Paper:
{{ paper }}";

pub fn note_tool() -> ToolSpec {
    ToolSpec {
        name: NOTE_TOOL_NAME.to_string(),
        description: "Record granular notes covering a research paper.".to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "notes": {
                    "type": "array",
                    "description": "Notes in reading order.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "note": {
                                "type": "string",
                                "description": "One atomic fact or claim from the paper."
                            }
                        },
                        "required": ["note"]
                    }
                }
            },
            "required": ["notes"]
        }),
    }
}

#[derive(Debug, Deserialize)]
struct NotesPayload {
    notes: Vec<PaperNote>,
}

/// Generate notes for a paper's full text. Tool choice is forced: note
/// taking has no legitimate plain-text reply.
pub async fn generate_notes(
    generator: &StructuredGenerator,
    paper_text: &str,
) -> Result<Vec<PaperNote>, GenerateError> {
    let tool = note_tool();
    let payload: NotesPayload = generator
        .generate(
            NOTE_PROMPT,
            minijinja::context! { paper => paper_text },
            &tool,
            ToolChoice::Forced(tool.name.clone()),
        )
        .await?;
    Ok(payload.notes)
}
