//! services/api/src/web/share.rs
//!
//! Handlers for creating share links and for opening them.

use crate::web::{
    protocol::{ResolveRequest, ResolveResponse, ShareExportQuery, ShareRequest, ShareResponse},
    rest::{markdown_download, session_not_found, HandlerError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use study_guide_core::{
    markdown,
    share::{ShareError, INVALID_LINK_MESSAGE},
    Resolution, SessionId, SharePayload, ShareResolver,
};
use tracing::error;

/// Build a share link for one view of a session.
#[utoipa::path(
    post,
    path = "/sessions/{id}/share",
    params(("id" = String, Path, description = "The session id.")),
    request_body = ShareRequest,
    responses(
        (status = 200, description = "The share link", body = ShareResponse),
        (status = 404, description = "No such session"),
        (status = 413, description = "The view is too large to fit in a link")
    )
)]
pub async fn create_share_link_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ShareRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = SessionId::from(id);
    let session = app_state
        .controller
        .find(&id)
        .ok_or_else(|| session_not_found(&id))?;

    let payload = SharePayload::from_session(&session, request.view);
    let url = app_state.share_links.build(&payload).map_err(|e| match e {
        ShareError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, e.to_string()),
        ShareError::Encode(_) => {
            error!("Failed to encode share payload: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create the share link".to_string(),
            )
        }
    })?;

    Ok(Json(ShareResponse { url }))
}

/// Work out what a location shows: a shared view, an invalid link, or a normal route.
#[utoipa::path(
    post,
    path = "/share/resolve",
    request_body = ResolveRequest,
    responses((status = 200, description = "The resolution", body = ResolveResponse))
)]
pub async fn resolve_handler(Json(request): Json<ResolveRequest>) -> impl IntoResponse {
    let response = match ShareResolver::resolve(&request.location) {
        Resolution::Shared(payload) => ResolveResponse::Shared { payload },
        Resolution::InvalidLink => ResolveResponse::InvalidLink {
            message: INVALID_LINK_MESSAGE.to_string(),
        },
        Resolution::Route(route) => ResolveResponse::Route { route },
    };
    Json(response)
}

/// Download the shared view of a link as Markdown.
#[utoipa::path(
    get,
    path = "/share/export",
    params(ShareExportQuery),
    responses(
        (status = 200, description = "The Markdown file", body = String, content_type = "text/markdown"),
        (status = 400, description = "Not a valid share link")
    )
)]
pub async fn export_shared_handler(
    Query(query): Query<ShareExportQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    match ShareResolver::resolve(&query.fragment) {
        Resolution::Shared(payload) => Ok(markdown_download(markdown::export_share(&payload))),
        Resolution::InvalidLink | Resolution::Route(_) => {
            Err((StatusCode::BAD_REQUEST, INVALID_LINK_MESSAGE.to_string()))
        }
    }
}
