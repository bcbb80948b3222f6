//! Record types stored in LanceDB.
//!
//! LanceDB uses Apache Arrow for storage; the Arrow encodings live in
//! `schema_arrow`. Notes and follow-up questions are kept as JSON text
//! columns and validated on read.

/// Embedding dimension (text-embedding-3-small outputs 1536-dim vectors).
pub const EMBEDDING_DIM: usize = 1536;

/// One atomic extracted fact about a paper, in model output order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PaperNote {
    pub note: String,
}

/// Paper row. The source URL is the unique key; rows are never mutated
/// after insert.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Paper {
    pub id: uuid::Uuid,
    pub url: String,
    pub name: String,
    /// Concatenated extracted text of the whole paper.
    pub text: String,
    pub notes: Vec<PaperNote>,
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Paper {
    pub fn new(url: String, name: String, text: String, notes: Vec<PaperNote>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            url,
            name,
            text,
            notes,
            ingested_at: chrono::Utc::now(),
        }
    }
}

/// Provenance-tagged span of extracted paper text, the unit indexed for
/// similarity search.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Chunk {
    pub id: uuid::Uuid,
    pub paper_url: String,
    pub chunk_index: i64,
    pub content: String,
    pub page: Option<i64>,
    pub embedding: Option<Vec<f32>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Chunk {
    pub fn new(paper_url: String, chunk_index: i64, content: String, page: Option<i64>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            paper_url,
            chunk_index,
            content,
            page,
            embedding: None,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Append-only transcript of one generated answer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QaRecord {
    pub id: uuid::Uuid,
    pub question: String,
    pub answer: String,
    /// Retrieval context captured at answer time.
    pub context: String,
    pub followup_questions: Vec<String>,
    pub asked_at: chrono::DateTime<chrono::Utc>,
}

impl QaRecord {
    pub fn new(
        question: String,
        answer: String,
        context: String,
        followup_questions: Vec<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            question,
            answer,
            context,
            followup_questions,
            asked_at: chrono::Utc::now(),
        }
    }
}

pub const TABLE_PAPERS: &str = "papers";
pub const TABLE_EMBEDDINGS: &str = "embeddings";
pub const TABLE_QA: &str = "qa";
