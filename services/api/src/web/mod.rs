pub mod chat;
pub mod preferences;
pub mod protocol;
pub mod quiz;
pub mod rest;
pub mod share;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use state::AppState;

/// Builds the API router. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    let body_limit = app_state.config.max_upload_bytes;

    let session_routes = Router::new()
        .route(
            "/sessions",
            get(rest::list_sessions_handler).delete(rest::clear_history_handler),
        )
        .route("/sessions/upload", post(rest::upload_session_handler))
        .route("/sessions/url", post(rest::document_session_handler))
        .route("/sessions/video", post(rest::video_session_handler))
        .route("/sessions/{id}", get(rest::get_session_handler))
        .route("/sessions/{id}/export", get(rest::export_session_handler))
        .route("/sessions/{id}/share", post(share::create_share_link_handler))
        .route("/sessions/{id}/quiz/grade", post(quiz::grade_quiz_handler))
        .route("/sessions/{id}/chat", post(chat::chat_handler))
        .route("/sessions/{id}/chat/stream", post(chat::chat_stream_handler))
        .route(
            "/active",
            get(rest::get_active_handler)
                .put(rest::select_active_handler)
                .delete(rest::start_new_handler),
        )
        .route("/status", get(rest::status_handler));

    let assistant_routes = Router::new()
        .route("/chat", post(chat::assistant_handler))
        .route("/chat/stream", post(chat::assistant_stream_handler));

    let share_routes = Router::new()
        .route("/share/resolve", post(share::resolve_handler))
        .route("/share/export", get(share::export_shared_handler));

    let preference_routes = Router::new()
        .route(
            "/preferences/theme",
            get(preferences::get_theme_handler).put(preferences::set_theme_handler),
        )
        .route(
            "/preferences/theme/toggle",
            post(preferences::toggle_theme_handler),
        );

    Router::new()
        .merge(session_routes)
        .merge(assistant_routes)
        .merge(share_routes)
        .merge(preference_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state)
}
