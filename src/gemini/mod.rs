//! Generative AI integration
//!
//! Provides:
//! - The `GenerativeBackend` capability used by the riddle pipeline
//! - A Gemini REST client (text via `generateContent`, images via Imagen `predict`)
//! - Typed errors that keep rate limiting distinct from other failures

mod client;
#[cfg(test)]
pub(crate) mod stub;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::GeminiClient;

/// Default text model
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Default image model
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// Default REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Errors raised by a generative backend
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// No API key available
    #[error("Gemini API key not configured")]
    NotConfigured,

    /// The service is throttling requests (HTTP 429 / RESOURCE_EXHAUSTED)
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The service answered with a non-success status
    #[error("API error {status}: {message}")]
    Service { status: u16, message: String },

    /// The request never produced an HTTP response
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body could not be interpreted
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Text generation request
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub model: String,
    pub prompt: String,
    pub system_instruction: String,
    /// When set, the model must answer with JSON matching this schema
    pub response_schema: Option<serde_json::Value>,
    pub temperature: f32,
}

/// Image generation request
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub count: u32,
    pub aspect_ratio: String,
    pub mime_type: String,
}

/// External text and image generation capability
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Generate text; structured JSON when the request carries a schema
    async fn generate_text(&self, request: TextRequest) -> Result<String, AiError>;

    /// Generate images, returned as base64-encoded payloads
    async fn generate_images(&self, request: ImageRequest) -> Result<Vec<String>, AiError>;
}

/// Gemini connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}
