use axum::{extract::State, http::StatusCode, Json};
use netlog_engine::{render_answer, Session};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::models::{ApiError, AskRequest, AskResponse};
use crate::state::AppState;

pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, Json<ApiError>)> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ApiError::bad_request("Question must not be empty"));
    }

    let (file_name, excerpt) = {
        let uploads = state
            .uploads
            .read()
            .map_err(|_| ApiError::internal("Upload store unavailable"))?;
        uploads
            .get(&req.upload_id)
            .map(|u| (u.file_name.clone(), u.excerpt.clone()))
    }
    .ok_or_else(|| ApiError::not_found("Upload not found, please upload the log again"))?;

    // fresh session per question
    let session = Session::new();
    let transport = state.transport.kind();
    let start = Instant::now();
    info!(
        session = %session,
        upload = %req.upload_id,
        file = %file_name,
        transport = %transport,
        "ASK request"
    );

    let result = state.transport.ask(&session, excerpt.as_str(), question).await;
    let ok = result.is_ok();
    if let Err(e) = &result {
        warn!(session = %session, error = %e, "Generative Engine call failed");
    }

    let elapsed = start.elapsed().as_millis();
    info!(session = %session, ok, time_ms = elapsed, "ASK complete");

    Ok(Json(AskResponse {
        answer: render_answer(result),
        ok,
        session_id: session.id().to_string(),
        transport: transport.to_string(),
        response_time_ms: elapsed,
    }))
}
