//! services/api/src/web/preferences.rs

use crate::web::{protocol::ThemeBody, state::AppState};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

/// The stored theme, `light` when none was saved.
#[utoipa::path(
    get,
    path = "/preferences/theme",
    responses((status = 200, description = "The current theme", body = ThemeBody))
)]
pub async fn get_theme_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let theme = app_state.theme().current();
    Json(ThemeBody { theme })
}

#[utoipa::path(
    put,
    path = "/preferences/theme",
    request_body = ThemeBody,
    responses((status = 200, description = "The saved theme", body = ThemeBody))
)]
pub async fn set_theme_handler(
    State(app_state): State<Arc<AppState>>,
    Json(body): Json<ThemeBody>,
) -> impl IntoResponse {
    app_state.theme().save(body.theme);
    Json(body)
}

#[utoipa::path(
    post,
    path = "/preferences/theme/toggle",
    responses((status = 200, description = "The theme after switching", body = ThemeBody))
)]
pub async fn toggle_theme_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let theme = app_state.theme().toggle();
    Json(ThemeBody { theme })
}
