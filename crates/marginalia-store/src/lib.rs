//! marginalia-store — the knowledge store.
//!
//! Three record kinds live in an embedded (or remote) LanceDB database:
//! papers with their notes, chunk embeddings for similarity search, and the
//! append-only QA transcript log. The [`KnowledgeStore`] facade owns the
//! connection plus an embedding backend and exposes the five store
//! operations the pipelines consume.

pub mod database;
pub mod embeddings;
pub mod error;
pub mod papers;
pub mod qa;
pub mod schema;
pub mod schema_arrow;
pub mod store;

pub use database::Database;
pub use embeddings::EmbeddingRepository;
pub use error::{Result, StoreError};
pub use papers::PaperRepository;
pub use qa::QaRepository;
pub use schema::{
    Chunk, Paper, PaperNote, QaRecord, EMBEDDING_DIM, TABLE_EMBEDDINGS, TABLE_PAPERS, TABLE_QA,
};
pub use store::KnowledgeStore;
