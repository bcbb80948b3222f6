//! Retrieval-QA pipeline.
//!
//! Context gathering (paper lookup, similarity search) fans out
//! concurrently; answer generation follows; each candidate answer is then
//! persisted as its own QA record, with per-record failures isolated.

use std::sync::Arc;

use futures::future::join_all;
use marginalia_llm::{GenerateError, StructuredGenerator};
use marginalia_store::{Chunk, KnowledgeStore, PaperNote, StoreError};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::answer::{generate_answers, Answer};

/// How many chunks similarity search feeds into answer generation.
pub const DEFAULT_TOP_K: usize = 8;

#[derive(Debug, Error)]
pub enum QaError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct QaPipeline {
    generator: StructuredGenerator,
    store: Arc<KnowledgeStore>,
}

impl QaPipeline {
    pub fn new(generator: StructuredGenerator, store: Arc<KnowledgeStore>) -> Self {
        Self { generator, store }
    }

    #[instrument(skip(self, question))]
    pub async fn answer_question(
        &self,
        question: &str,
        paper_url: &str,
    ) -> Result<Vec<Answer>, QaError> {
        // Both reads are independent; fetch them together.
        let (paper, chunks) = tokio::try_join!(
            self.store.get_paper(paper_url),
            self.store.similarity_search(question, DEFAULT_TOP_K, paper_url),
        )?;
        info!(chunks = chunks.len(), notes = paper.notes.len(), "context gathered");

        let context = chunks_as_text(&chunks);
        let notes_text = notes_as_text(&paper.notes);

        let answers = generate_answers(&self.generator, &context, &notes_text, question).await?;
        info!(candidates = answers.len(), "answers generated");

        // One QA record per candidate; a failed write must not block the
        // others or the response.
        let writes = answers.iter().map(|a| {
            self.store
                .put_qa(question, &a.answer, &context, a.followup_questions.clone())
        });
        for outcome in join_all(writes).await {
            if let Err(e) = outcome {
                warn!(error = %e, "failed to persist qa record");
            }
        }

        Ok(answers)
    }
}

/// Join retrieved chunks into prompt context, in retrieval order.
pub fn chunks_as_text(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Join stored notes into prompt context, one per line.
pub fn notes_as_text(notes: &[PaperNote]) -> String {
    notes
        .iter()
        .map(|n| n.note.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
