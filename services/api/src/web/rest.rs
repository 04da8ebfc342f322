//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the session endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{chat, preferences, protocol::*, quiz, share, state::AppState};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use study_guide_core::{
    markdown, ControllerError, ExportSection, ExtractionError, InputSource, MarkdownDocument,
    SessionId, GENERATION_FAILED_MESSAGE,
};
use tracing::error;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        upload_session_handler,
        document_session_handler,
        video_session_handler,
        list_sessions_handler,
        clear_history_handler,
        get_session_handler,
        export_session_handler,
        get_active_handler,
        select_active_handler,
        start_new_handler,
        status_handler,
        share::create_share_link_handler,
        share::resolve_handler,
        share::export_shared_handler,
        quiz::grade_quiz_handler,
        chat::chat_handler,
        chat::chat_stream_handler,
        chat::assistant_handler,
        chat::assistant_stream_handler,
        preferences::get_theme_handler,
        preferences::set_theme_handler,
        preferences::toggle_theme_handler,
    ),
    components(
        schemas(
            UrlRequest, SessionSummary, SessionResponse, SelectRequest, ActiveResponse,
            StatusResponse, ShareRequest, ShareResponse, ResolveRequest, ResolveResponse,
            QuizAnswersRequest, QuizScoreResponse, ChatRequest, ChatResponse, ThemeBody
        )
    ),
    tags(
        (name = "Study Guide API", description = "Turns documents and videos into summaries, key concepts, flashcards and quizzes.")
    )
)]
pub struct ApiDoc;

pub type HandlerError = (StatusCode, String);

/// Maps a controller failure onto the status code and the text shown to the user.
pub fn controller_error(e: ControllerError) -> HandlerError {
    match e {
        ControllerError::Busy | ControllerError::PendingError => {
            (StatusCode::CONFLICT, e.to_string())
        }
        ControllerError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        ControllerError::Extraction(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        ControllerError::Generation(_) => {
            (StatusCode::BAD_GATEWAY, GENERATION_FAILED_MESSAGE.to_string())
        }
        ControllerError::History(e) => {
            error!("Failed to store the new session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERATION_FAILED_MESSAGE.to_string(),
            )
        }
    }
}

pub fn session_not_found(id: &SessionId) -> HandlerError {
    controller_error(ControllerError::NotFound(id.clone()))
}

/// A Markdown file as an attachment download.
pub fn markdown_download(document: MarkdownDocument) -> impl IntoResponse {
    // Header values must be visible ASCII; anything else in the name is replaced.
    let file_name: String = document
        .file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    (
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        document.body,
    )
}

/// Runs the pipeline on its own task so it finishes even if the client goes away.
async fn submit(
    app_state: &AppState,
    source: InputSource,
) -> Result<impl IntoResponse, HandlerError> {
    let controller = app_state.controller.clone();
    let pipeline = tokio::spawn(async move { controller.submit(source).await });
    let session = pipeline
        .await
        .map_err(|e| {
            error!("Pipeline task failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERATION_FAILED_MESSAGE.to_string(),
            )
        })?
        .map_err(controller_error)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session,
            active: true,
        }),
    ))
}

//=========================================================================================
// Session Creation
//=========================================================================================

/// Create a study guide from an uploaded PDF.
///
/// Accepts a multipart/form-data request; the first part carrying a file is used.
#[utoipa::path(
    post,
    path = "/sessions/upload",
    request_body(content_type = "multipart/form-data", description = "The PDF to upload."),
    responses(
        (status = 201, description = "Session created and made active", body = SessionResponse),
        (status = 400, description = "No file in the request"),
        (status = 409, description = "A document is already being processed, or the last attempt failed"),
        (status = 422, description = "The file could not be read or parsed"),
        (status = 502, description = "Content generation failed")
    )
)]
pub async fn upload_session_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let unreadable = |e: axum::extract::multipart::MultipartError| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            ExtractionError::Unreadable(e.to_string()).to_string(),
        )
    };

    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(unreadable)?;
        return submit(&app_state, InputSource::File { name, bytes }).await;
    }

    Err((
        StatusCode::BAD_REQUEST,
        "Multipart form must include a file".to_string(),
    ))
}

/// Create a study guide from a PDF link.
#[utoipa::path(
    post,
    path = "/sessions/url",
    request_body = UrlRequest,
    responses(
        (status = 201, description = "Session created and made active", body = SessionResponse),
        (status = 409, description = "A document is already being processed, or the last attempt failed"),
        (status = 422, description = "The document could not be downloaded or parsed"),
        (status = 502, description = "Content generation failed")
    )
)]
pub async fn document_session_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<UrlRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    submit(&app_state, InputSource::DocumentUrl(request.url)).await
}

/// Create a study guide from a video's captions.
#[utoipa::path(
    post,
    path = "/sessions/video",
    request_body = UrlRequest,
    responses(
        (status = 201, description = "Session created and made active", body = SessionResponse),
        (status = 409, description = "A document is already being processed, or the last attempt failed"),
        (status = 422, description = "The link is invalid or the transcript is unavailable"),
        (status = 502, description = "Content generation failed")
    )
)]
pub async fn video_session_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<UrlRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    submit(&app_state, InputSource::VideoUrl(request.url)).await
}

//=========================================================================================
// History
//=========================================================================================

/// List the stored sessions, oldest first.
#[utoipa::path(
    get,
    path = "/sessions",
    responses((status = 200, description = "The history list", body = [SessionSummary]))
)]
pub async fn list_sessions_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let active = app_state.controller.active_id();
    let sessions: Vec<SessionSummary> = app_state
        .controller
        .sessions()
        .iter()
        .map(|session| SessionSummary::new(session, active.as_ref() == Some(&session.id)))
        .collect();
    Json(sessions)
}

/// Delete the whole history.
#[utoipa::path(
    delete,
    path = "/sessions",
    responses(
        (status = 204, description = "History cleared"),
        (status = 409, description = "A document is being processed")
    )
)]
pub async fn clear_history_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    app_state
        .controller
        .clear_history()
        .map_err(controller_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Fetch one stored session with its study content.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = String, Path, description = "The session id (its creation timestamp).")),
    responses(
        (status = 200, description = "The session", body = SessionResponse),
        (status = 404, description = "No such session")
    )
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = SessionId::from(id);
    let session = app_state
        .controller
        .find(&id)
        .ok_or_else(|| session_not_found(&id))?;
    let active = app_state.controller.active_id().as_ref() == Some(&id);
    Ok(Json(SessionResponse { session, active }))
}

/// Download a session, or one section of it, as Markdown.
#[utoipa::path(
    get,
    path = "/sessions/{id}/export",
    params(
        ("id" = String, Path, description = "The session id."),
        ExportQuery
    ),
    responses(
        (status = 200, description = "The Markdown file", body = String, content_type = "text/markdown"),
        (status = 404, description = "No such session")
    )
)]
pub async fn export_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = SessionId::from(id);
    let session = app_state
        .controller
        .find(&id)
        .ok_or_else(|| session_not_found(&id))?;
    let section = query.section.unwrap_or(ExportSection::All);
    Ok(markdown_download(markdown::export(
        &session.content,
        &session.source_name,
        section,
    )))
}

//=========================================================================================
// Active Selection and Pipeline State
//=========================================================================================

/// The session currently shown.
#[utoipa::path(
    get,
    path = "/active",
    responses((status = 200, description = "The active session, if any", body = ActiveResponse))
)]
pub async fn get_active_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ActiveResponse {
        session: app_state.controller.active(),
    })
}

/// Make a stored session the active one.
#[utoipa::path(
    put,
    path = "/active",
    request_body = SelectRequest,
    responses(
        (status = 200, description = "The newly active session", body = ActiveResponse),
        (status = 404, description = "No such session"),
        (status = 409, description = "A document is being processed, or the last attempt failed")
    )
)]
pub async fn select_active_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let session = app_state
        .controller
        .select(&SessionId::from(request.id))
        .map_err(controller_error)?;
    Ok(Json(ActiveResponse {
        session: Some(session),
    }))
}

/// Start a new session: clear the selection and any error.
#[utoipa::path(
    delete,
    path = "/active",
    responses(
        (status = 204, description = "Back to the input view"),
        (status = 409, description = "A document is being processed")
    )
)]
pub async fn start_new_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    app_state.controller.start_new().map_err(controller_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Where the pipeline is.
#[utoipa::path(
    get,
    path = "/status",
    responses((status = 200, description = "The pipeline state", body = StatusResponse))
)]
pub async fn status_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let state = app_state.controller.state();
    let active_id = app_state.controller.active_id().map(|id| id.to_string());
    Json(StatusResponse::new(&state, active_id))
}
