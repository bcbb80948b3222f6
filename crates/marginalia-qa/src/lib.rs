//! marginalia-qa — retrieval-augmented question answering over an ingested
//! paper. Gathers the paper's stored notes and the most similar chunks,
//! generates validated answers with follow-up questions, and logs each
//! answer to the QA transcript.

pub mod answer;
pub mod pipeline;

pub use answer::Answer;
pub use pipeline::{QaError, QaPipeline};
