//! Ingestion endpoint — runs the take-notes pipeline and returns the notes.

use axum::extract::State;
use axum::Json;
use marginalia_ingestion::NoteJob;
use marginalia_store::PaperNote;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeNotesRequest {
    pub paper_url: String,
    pub name: String,
    #[serde(default)]
    pub pages_to_delete: Vec<u32>,
}

pub async fn take_notes(
    State(state): State<SharedState>,
    Json(req): Json<TakeNotesRequest>,
) -> Result<Json<Vec<PaperNote>>, ApiError> {
    let job = NoteJob {
        paper_url: req.paper_url,
        name: req.name,
        pages_to_delete: req.pages_to_delete,
    };
    let notes = state.ingestor.take_notes(job).await?;
    Ok(Json(notes))
}
