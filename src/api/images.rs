//! Image download endpoint
//!
//! GET /images/{hash} - Serve a generated image as a file attachment

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::{ApiError, AppState};
use crate::locale::Locale;

/// Everything except ASCII alphanumerics and `-._~` is percent-encoded
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Build the images router
pub fn router() -> Router<AppState> {
    Router::new().route("/{hash}", get(get_image))
}

/// Serve an image by hash
async fn get_image(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let image = state
        .service
        .image(&hash)
        .await
        .map_err(|e| ApiError::new(e, Locale::English))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, image.mime_type),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&image.filename),
            ),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        image.data,
    ))
}

/// Attachment header; non-ASCII names go in the RFC 5987 `filename*` form
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        utf8_percent_encode(filename, FILENAME_ENCODE_SET)
    )
}
