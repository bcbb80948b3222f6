//! marginalia-ingestion — the ingestion pipeline.
//!
//! Orchestrates the flow for one paper:
//!   1. Fetch the PDF by URL
//!   2. Optionally strip unwanted pages
//!   3. Extract ordered text chunks via the remote partition service
//!   4. Generate structured notes from the full text
//!   5. Persist paper+notes and chunk embeddings concurrently

pub mod acquire;
pub mod extract;
pub mod notes;
pub mod pipeline;

pub use acquire::AcquireError;
pub use extract::{ExtractError, ExtractedChunk, UnstructuredClient};
pub use pipeline::{IngestError, Ingestor, NoteJob};
