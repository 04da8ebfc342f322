//! services/api/src/web/chat.rs
//!
//! Handlers for asking questions about a stored session's source document, and
//! for the general assistant that is not tied to any session. The conversation
//! itself lives with the client and is sent with every question.

use crate::web::{
    protocol::{ChatRequest, ChatResponse},
    rest::{session_not_found, HandlerError},
    state::AppState,
};
use async_stream::stream;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
};
use futures::{Stream, StreamExt};
use std::{convert::Infallible, sync::Arc};
use study_guide_core::{ports::TextStream, SessionId};
use tracing::{error, info};

const CHAT_FAILED_MESSAGE: &str = "Sorry, I couldn't get a response from the AI. Please try again.";
const NO_SOURCE_TEXT_MESSAGE: &str =
    "This session was saved without its source text, so questions about it cannot be answered. Create the session again to chat with the document.";

/// Looks up the session's source text and checks the question is not blank.
fn chat_context(app_state: &AppState, id: String, request: &ChatRequest) -> Result<String, HandlerError> {
    let id = SessionId::from(id);
    let session = app_state
        .controller
        .find(&id)
        .ok_or_else(|| session_not_found(&id))?;

    if request.message.trim().is_empty() {
        return Err(blank_question());
    }

    session
        .chat_context()
        .map(str::to_string)
        .ok_or_else(|| (StatusCode::CONFLICT, NO_SOURCE_TEXT_MESSAGE.to_string()))
}

fn blank_question() -> HandlerError {
    (StatusCode::BAD_REQUEST, "The question must not be empty".to_string())
}

fn chat_failed(context: &str, e: impl std::fmt::Debug) -> HandlerError {
    error!("{}: {:?}", context, e);
    (StatusCode::BAD_GATEWAY, CHAT_FAILED_MESSAGE.to_string())
}

/// Forwards the model's text as `message` events, then `done`, or `error` if it fails midway.
fn answer_events(mut text_stream: TextStream) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = stream! {
        while let Some(chunk) = text_stream.next().await {
            match chunk {
                Ok(text) => yield Ok::<_, Infallible>(Event::default().data(text)),
                Err(e) => {
                    error!("Chat stream failed: {:?}", e);
                    yield Ok(Event::default().event("error").data(CHAT_FAILED_MESSAGE));
                    return;
                }
            }
        }
        info!("Chat stream finished");
        yield Ok(Event::default().event("done").data(""));
    };

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Ask a question, answered only from the session's document.
#[utoipa::path(
    post,
    path = "/sessions/{id}/chat",
    params(("id" = String, Path, description = "The session id.")),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The answer", body = ChatResponse),
        (status = 400, description = "Empty question"),
        (status = 404, description = "No such session"),
        (status = 409, description = "The session has no source text"),
        (status = 502, description = "The chat model failed")
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let document_text = chat_context(&app_state, id, &request)?;

    let answer = app_state
        .chat_adapter
        .answer(&document_text, &request.history, request.message.trim())
        .await
        .map_err(|e| chat_failed("Failed to answer chat question", e))?;

    Ok(Json(ChatResponse { answer }))
}

/// Same as the chat endpoint, streaming the answer as Server-Sent Events.
///
/// Each `message` event carries the next piece of the answer. The stream ends
/// with a `done` event, or with an `error` event if the model fails midway.
#[utoipa::path(
    post,
    path = "/sessions/{id}/chat/stream",
    params(("id" = String, Path, description = "The session id.")),
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The answer as an event stream", content_type = "text/event-stream"),
        (status = 400, description = "Empty question"),
        (status = 404, description = "No such session"),
        (status = 409, description = "The session has no source text"),
        (status = 502, description = "The chat model failed")
    )
)]
pub async fn chat_stream_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let document_text = chat_context(&app_state, id, &request)?;

    let text_stream = app_state
        .chat_adapter
        .answer_streaming(&document_text, &request.history, request.message.trim())
        .await
        .map_err(|e| chat_failed("Failed to start chat stream", e))?;

    Ok(answer_events(text_stream))
}

//=========================================================================================
// General Assistant
//=========================================================================================

/// Ask the general assistant a question.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The answer", body = ChatResponse),
        (status = 400, description = "Empty question"),
        (status = 502, description = "The chat model failed")
    )
)]
pub async fn assistant_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if request.message.trim().is_empty() {
        return Err(blank_question());
    }

    let answer = app_state
        .assistant_adapter
        .reply(&request.history, request.message.trim())
        .await
        .map_err(|e| chat_failed("Failed to answer assistant question", e))?;

    Ok(Json(ChatResponse { answer }))
}

/// Same as the assistant endpoint, streaming the answer as Server-Sent Events.
#[utoipa::path(
    post,
    path = "/chat/stream",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The answer as an event stream", content_type = "text/event-stream"),
        (status = 400, description = "Empty question"),
        (status = 502, description = "The chat model failed")
    )
)]
pub async fn assistant_stream_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if request.message.trim().is_empty() {
        return Err(blank_question());
    }

    let text_stream = app_state
        .assistant_adapter
        .reply_streaming(&request.history, request.message.trim())
        .await
        .map_err(|e| chat_failed("Failed to start assistant stream", e))?;

    Ok(answer_events(text_stream))
}
