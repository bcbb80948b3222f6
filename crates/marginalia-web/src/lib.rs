//! marginalia-web — HTTP surface for the ingestion and QA pipelines.
//!
//! Routes:
//!   GET  /            liveness probe
//!   POST /take_notes  run the ingestion pipeline, return the notes
//!   POST /qa          answer a question about an ingested paper

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
