//! QA endpoint — answers a question about an already-ingested paper.

use axum::extract::State;
use axum::Json;
use marginalia_qa::Answer;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaRequest {
    pub paper_url: String,
    pub question: String,
}

pub async fn qa(
    State(state): State<SharedState>,
    Json(req): Json<QaRequest>,
) -> Result<Json<Vec<Answer>>, ApiError> {
    let answers = state.qa.answer_question(&req.question, &req.paper_url).await?;
    Ok(Json(answers))
}
