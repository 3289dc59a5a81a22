//! Riddle image generation pipeline
//!
//! 1. Image model renders the riddle description (two variations)
//! 2. Every payload is decoded, then each is stored under its content hash
//! 3. Callers get the hashes back for later download

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ServiceError;
use crate::gemini::AiError;
use crate::images::ImageStore;
use crate::locale::Action;
use crate::riddle::{download_filename, Riddle, RiddleError, RiddlePipeline, IMAGE_MIME_TYPE};

/// A generated image ready for the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedImage {
    pub hash: String,
    pub filename: String,
    pub mime_type: String,
    /// Base64 payload, as returned by the image model
    pub data: String,
}

/// Generate images for a riddle and keep them in the image store
pub async fn generate_riddle_images(
    pipeline: &RiddlePipeline,
    image_store: &ImageStore,
    riddle: &Riddle,
) -> Result<Vec<SavedImage>, ServiceError> {
    let payloads = pipeline
        .request_images(riddle)
        .await
        .map_err(|source| ServiceError::Action {
            action: Action::Images,
            source,
        })?;

    // Decode everything first so a bad payload leaves nothing behind
    let decoded = payloads
        .iter()
        .enumerate()
        .map(|(index, payload)| {
            BASE64.decode(payload.as_bytes()).map_err(|e| ServiceError::Action {
                action: Action::Images,
                source: RiddleError::Ai(AiError::MalformedResponse(format!(
                    "image {} is not valid base64: {}",
                    index + 1,
                    e
                ))),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut saved = Vec::with_capacity(payloads.len());
    for (index, (payload, bytes)) in payloads.into_iter().zip(decoded).enumerate() {
        let filename = download_filename(riddle, index);
        let hash = image_store
            .store(&bytes, IMAGE_MIME_TYPE, &filename)
            .await?;
        debug!("Image {} stored as {}", index + 1, hash);

        saved.push(SavedImage {
            hash,
            filename,
            mime_type: IMAGE_MIME_TYPE.to_string(),
            data: payload,
        });
    }

    info!(
        "Stored {} images for riddle #{} '{}'",
        saved.len(),
        riddle.riddle_number,
        riddle.title
    );
    Ok(saved)
}
