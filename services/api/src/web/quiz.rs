//! services/api/src/web/quiz.rs
//!
//! Grading a session's quiz.

use crate::web::{
    protocol::{QuizAnswersRequest, QuizScoreResponse},
    rest::{session_not_found, HandlerError},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use study_guide_core::{quiz, SessionId};

/// Score answers against a session's quiz.
#[utoipa::path(
    post,
    path = "/sessions/{id}/quiz/grade",
    params(("id" = String, Path, description = "The session id.")),
    request_body = QuizAnswersRequest,
    responses(
        (status = 200, description = "The score with a per-question breakdown", body = QuizScoreResponse),
        (status = 400, description = "More answers than questions"),
        (status = 404, description = "No such session")
    )
)]
pub async fn grade_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<QuizAnswersRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = SessionId::from(id);
    let session = app_state
        .controller
        .find(&id)
        .ok_or_else(|| session_not_found(&id))?;

    let score = quiz::grade(&session.content.quiz, &request.answers)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(QuizScoreResponse::from(score)))
}
