//! End-to-end ingestion pipeline for a single paper.
//!
//! Stages with data dependencies run strictly in order; the two terminal
//! writes (paper+notes, chunk embeddings) are independent and run
//! concurrently, but the ingestion only succeeds if both do.

use std::sync::Arc;

use marginalia_llm::{GenerateError, StructuredGenerator};
use marginalia_store::{Chunk, KnowledgeStore, PaperNote, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::acquire::{fetch_pdf, remove_pages, AcquireError};
use crate::extract::{ExtractError, UnstructuredClient};
use crate::notes::generate_notes;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("not a pdf url: {0}")]
    NotPdf(String),
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parameters for one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteJob {
    pub paper_url: String,
    pub name: String,
    /// 1-based pages to strip before extraction; empty skips the trim stage.
    pub pages_to_delete: Vec<u32>,
}

/// The URL must name a `.pdf` resource. Checked before any network call.
pub fn validate_job(job: &NoteJob) -> Result<(), IngestError> {
    if !job.paper_url.ends_with(".pdf") {
        return Err(IngestError::NotPdf(job.paper_url.clone()));
    }
    Ok(())
}

pub struct Ingestor {
    http: reqwest::Client,
    extractor: UnstructuredClient,
    generator: StructuredGenerator,
    store: Arc<KnowledgeStore>,
}

impl Ingestor {
    pub fn new(
        extractor: UnstructuredClient,
        generator: StructuredGenerator,
        store: Arc<KnowledgeStore>,
    ) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .user_agent("marginalia/0.1 (research)")
                .build()
                .expect("Failed to create HTTP client"),
            extractor,
            generator,
            store,
        }
    }

    /// Run the full pipeline: fetch → trim → extract → notes → persist.
    /// No retries; any stage failure aborts the run and surfaces to the
    /// caller so it can re-ingest or reconcile.
    #[instrument(skip(self, job), fields(url = %job.paper_url))]
    pub async fn take_notes(&self, job: NoteJob) -> Result<Vec<PaperNote>, IngestError> {
        validate_job(&job)?;

        let mut pdf = fetch_pdf(&self.http, &job.paper_url).await?;
        info!(bytes = pdf.len(), "pdf fetched");

        if !job.pages_to_delete.is_empty() {
            pdf = remove_pages(&pdf, &job.pages_to_delete)?;
            info!(pages = job.pages_to_delete.len(), "pages trimmed");
        }

        let extracted = self.extractor.partition(&pdf).await?;
        info!(chunks = extracted.len(), "text extracted");

        let full_text = extracted
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let notes = generate_notes(&self.generator, &full_text).await?;
        info!(notes = notes.len(), "notes generated");

        let chunks: Vec<Chunk> = extracted
            .into_iter()
            .enumerate()
            .map(|(i, c)| Chunk::new(job.paper_url.clone(), i as i64, c.content, c.page))
            .collect();

        // Independent writes with no ordering dependency. Either failure
        // fails the whole ingestion, even if the other side landed; the
        // caller decides whether to re-ingest.
        let (paper, indexed) = tokio::try_join!(
            async {
                self.store
                    .put_paper(&job.paper_url, &job.name, full_text.clone(), notes.clone())
                    .await
                    .map_err(IngestError::from)
            },
            async {
                self.store
                    .put_chunks(chunks)
                    .await
                    .map_err(IngestError::from)
            },
        )?;

        info!(paper_id = %paper.id, chunks = indexed, "ingestion persisted");
        Ok(paper.notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_pdf_url_fails_before_any_fetch() {
        let job = NoteJob {
            paper_url: "https://example.com/paper.html".to_string(),
            name: "nope".to_string(),
            pages_to_delete: vec![],
        };
        let err = validate_job(&job).unwrap_err();
        assert!(matches!(err, IngestError::NotPdf(_)));
    }

    #[test]
    fn test_pdf_url_passes_validation() {
        let job = NoteJob {
            paper_url: "https://arxiv.org/pdf/2305.15334.pdf".to_string(),
            name: "gorilla".to_string(),
            pages_to_delete: vec![1],
        };
        assert!(validate_job(&job).is_ok());
    }
}
