//! Theme and riddle endpoints
//!
//! GET  /themes                             - Theme catalog
//! GET  /themes/{id}/riddles                - Select a theme (its history)
//! POST /themes/{id}/riddles                - Generate the next riddle
//! POST /themes/{id}/riddles/{n}/improve    - Improve a description
//! POST /themes/{id}/riddles/{n}/images     - Generate images

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::{ApiError, AppState};
use crate::images::SavedImage;
use crate::locale::Locale;
use crate::riddle::Riddle;
use crate::theme::Theme;

/// Build the riddles router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/themes", get(list_themes))
        .route(
            "/themes/{theme_id}/riddles",
            get(list_riddles).post(generate_riddle),
        )
        .route(
            "/themes/{theme_id}/riddles/{riddle_number}/improve",
            post(improve_riddle),
        )
        .route(
            "/themes/{theme_id}/riddles/{riddle_number}/images",
            post(generate_images),
        )
}

/// Theme catalog entry
#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    #[serde(flatten)]
    pub theme: Theme,
    pub locale: Locale,
    pub direction: &'static str,
}

impl From<&Theme> for ThemeResponse {
    fn from(theme: &Theme) -> Self {
        let locale = Locale::detect(&theme.title);
        Self {
            theme: theme.clone(),
            locale,
            direction: locale.direction(),
        }
    }
}

/// History of a selected theme
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub theme: ThemeResponse,
    pub riddles: Vec<Riddle>,
    /// Number the next generated riddle will get
    pub next_riddle_number: u32,
}

/// Images generated for a riddle
#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub images: Vec<SavedImage>,
}

/// List all themes
async fn list_themes(State(state): State<AppState>) -> impl IntoResponse {
    let themes: Vec<ThemeResponse> = state.service.themes().iter().map(Into::into).collect();
    Json(themes)
}

/// Load the history of a theme
async fn list_riddles(
    Path(theme_id): Path<u32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let locale = state.service.locale(theme_id);
    let err = |e| ApiError::new(e, locale);

    let theme = state.service.theme(theme_id).map_err(err)?;
    let riddles = state.service.history(theme_id).await.map_err(err)?;

    Ok(Json(HistoryResponse {
        theme: theme.into(),
        next_riddle_number: riddles.len() as u32 + 1,
        riddles,
    }))
}

/// Generate and persist the next riddle
async fn generate_riddle(
    Path(theme_id): Path<u32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let locale = state.service.locale(theme_id);
    let generated = state
        .service
        .generate_next(theme_id)
        .await
        .map_err(|e| ApiError::new(e, locale))?;

    Ok((StatusCode::CREATED, Json(generated)))
}

/// Improve a riddle description
async fn improve_riddle(
    Path((theme_id, riddle_number)): Path<(u32, u32)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let locale = state.service.locale(theme_id);
    let riddle = state
        .service
        .improve(theme_id, riddle_number)
        .await
        .map_err(|e| ApiError::new(e, locale))?;

    Ok(Json(riddle))
}

/// Generate images for a riddle
async fn generate_images(
    Path((theme_id, riddle_number)): Path<(u32, u32)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let locale = state.service.locale(theme_id);
    let images = state
        .service
        .request_images(theme_id, riddle_number)
        .await
        .map_err(|e| ApiError::new(e, locale))?;

    Ok(Json(ImagesResponse { images }))
}
