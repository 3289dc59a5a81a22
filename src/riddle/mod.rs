//! Riddle generation pipeline
//!
//! Three independent operations, each a single call to the generative backend:
//! 1. Generate the next riddle of a theme from its history
//! 2. Rewrite a riddle description more vividly
//! 3. Turn a riddle description into images

mod generate;
mod images;
mod improve;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::gemini::{AiError, GeminiConfig, GenerativeBackend};

pub use generate::{previous_riddle_context, GeneratedRiddle, CONTEXT_EXCERPT_CHARS};
pub use images::{download_filename, image_prompt, IMAGE_ASPECT_RATIO, IMAGE_COUNT, IMAGE_MIME_TYPE};

/// One generated riddle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Riddle {
    /// Position in the theme's history, starting at 1
    pub riddle_number: u32,
    pub title: String,
    /// Rich visual description, also the image prompt
    pub description: String,
    pub solution: String,
}

/// Errors raised by the pipeline
#[derive(Debug, thiserror::Error)]
pub enum RiddleError {
    #[error(transparent)]
    Ai(#[from] AiError),

    /// The image model answered without any image
    #[error("image model returned no images")]
    NoImages,
}

impl RiddleError {
    /// Whether the failure comes from service throttling
    pub fn is_rate_limited(&self) -> bool {
        match self {
            RiddleError::Ai(e) => crate::error::is_rate_limited(e),
            RiddleError::NoImages => false,
        }
    }
}

/// Runs riddle operations against a generative backend
#[derive(Clone)]
pub struct RiddlePipeline {
    backend: Arc<dyn GenerativeBackend>,
    text_model: String,
    image_model: String,
}

impl RiddlePipeline {
    /// Create a pipeline using the configured models
    pub fn new(backend: Arc<dyn GenerativeBackend>, config: &GeminiConfig) -> Self {
        Self {
            backend,
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        }
    }
}
