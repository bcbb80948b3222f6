//! The knowledge-store facade consumed by the pipelines.
//!
//! Owns the LanceDB database plus the embedding backend, so callers deal in
//! text: `put_chunks` embeds before indexing, `similarity_search` embeds the
//! query before searching.

use std::sync::Arc;

use marginalia_llm::LlmBackend;
use tracing::{debug, instrument};

use crate::database::Database;
use crate::embeddings::EmbeddingRepository;
use crate::error::{Result, StoreError};
use crate::papers::PaperRepository;
use crate::qa::QaRepository;
use crate::schema::{Chunk, Paper, PaperNote, QaRecord, EMBEDDING_DIM};

pub struct KnowledgeStore {
    db: Arc<Database>,
    papers: PaperRepository,
    embeddings: EmbeddingRepository,
    qa: QaRepository,
    backend: Arc<dyn LlmBackend>,
}

impl KnowledgeStore {
    /// Open the database, create missing tables, and wire up the embedding
    /// backend.
    pub async fn connect(
        uri: &str,
        api_key: Option<&str>,
        backend: Arc<dyn LlmBackend>,
    ) -> Result<Self> {
        let db = Arc::new(Database::open(uri, api_key).await?);
        db.initialize().await?;

        Ok(Self {
            papers: PaperRepository::new(db.clone()),
            embeddings: EmbeddingRepository::new(db.clone()),
            qa: QaRepository::new(db.clone()),
            db,
            backend,
        })
    }

    pub fn database(&self) -> Arc<Database> {
        self.db.clone()
    }

    /// Insert a paper with its notes. URL is the unique key: a second insert
    /// for the same URL is rejected, keeping paper rows immutable.
    #[instrument(skip(self, text, notes))]
    pub async fn put_paper(
        &self,
        url: &str,
        name: &str,
        text: String,
        notes: Vec<PaperNote>,
    ) -> Result<Paper> {
        if self.papers.find_by_url(url).await?.is_some() {
            return Err(StoreError::Duplicate(format!("paper already ingested: {url}")));
        }

        let paper = Paper::new(url.to_string(), name.to_string(), text, notes);
        self.papers.insert(&paper).await?;
        debug!(url, notes = paper.notes.len(), "paper stored");
        Ok(paper)
    }

    pub async fn get_paper(&self, url: &str) -> Result<Paper> {
        self.papers
            .find_by_url(url)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("no paper for url: {url}")))
    }

    /// Embed and index a batch of chunks. Embedding happens in one backend
    /// call and the rows land through one table write, so the batch either
    /// commits or surfaces an error for the caller to retry.
    #[instrument(skip(self, chunks), fields(n = chunks.len()))]
    pub async fn put_chunks(&self, mut chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.backend.embed(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(StoreError::InvalidRecord(format!(
                "embedding backend returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        for (chunk, vector) in chunks.iter_mut().zip(vectors) {
            if vector.len() != EMBEDDING_DIM {
                return Err(StoreError::InvalidEmbeddingDimension {
                    expected: EMBEDDING_DIM,
                    actual: vector.len(),
                });
            }
            chunk.embedding = Some(vector);
        }

        let inserted = self.embeddings.insert_batch(&chunks).await?;
        debug!(inserted, "chunks embedded and indexed");
        Ok(inserted)
    }

    /// Top-k chunks for `query`, restricted to one paper. No matching chunks
    /// is an empty result, not an error.
    #[instrument(skip(self, query))]
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        paper_url: &str,
    ) -> Result<Vec<Chunk>> {
        let vectors = self.backend.embed(&[query.to_string()]).await?;
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidRecord("backend returned no query vector".into()))?;

        let escaped = paper_url.replace('\'', "''");
        self.embeddings
            .search_similar_filtered(&query_vector, k, &format!("paper_url = '{}'", escaped))
            .await
    }

    /// Append one QA transcript row.
    pub async fn put_qa(
        &self,
        question: &str,
        answer: &str,
        context: &str,
        followup_questions: Vec<String>,
    ) -> Result<()> {
        let record = QaRecord::new(
            question.to_string(),
            answer.to_string(),
            context.to_string(),
            followup_questions,
        );
        self.qa.insert(&record).await
    }

    pub async fn paper_count(&self) -> Result<u64> {
        self.papers.count().await
    }

    pub async fn chunk_count_for_paper(&self, paper_url: &str) -> Result<u64> {
        self.embeddings.count_for_paper(paper_url).await
    }

    pub async fn qa_count(&self) -> Result<u64> {
        self.qa.count().await
    }
}
