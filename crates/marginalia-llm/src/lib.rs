//! marginalia-llm — completion/embedding backend client and the
//! structured-output generator used for note and answer generation.

pub mod backend;
pub mod generate;

pub use backend::{
    ChatOutcome, ChatRequest, LlmBackend, LlmError, Message, OpenAiBackend, ToolCall, ToolChoice,
    ToolSpec,
};
pub use generate::{GenerateError, StructuredGenerator};
