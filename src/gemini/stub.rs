//! Scripted backend for unit tests

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{AiError, GenerativeBackend, ImageRequest, TextRequest};

/// Replays queued responses and records every request it receives
#[derive(Default)]
pub(crate) struct StubBackend {
    text_responses: Mutex<VecDeque<Result<String, AiError>>>,
    image_responses: Mutex<VecDeque<Result<Vec<String>, AiError>>>,
    pub text_requests: Mutex<Vec<TextRequest>>,
    pub image_requests: Mutex<Vec<ImageRequest>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, response: Result<String, AiError>) {
        self.text_responses.lock().push_back(response);
    }

    pub fn push_images(&self, response: Result<Vec<String>, AiError>) {
        self.image_responses.lock().push_back(response);
    }

    pub fn last_text_request(&self) -> Option<TextRequest> {
        self.text_requests.lock().last().cloned()
    }

    pub fn last_image_request(&self) -> Option<ImageRequest> {
        self.image_requests.lock().last().cloned()
    }
}

#[async_trait]
impl GenerativeBackend for StubBackend {
    async fn generate_text(&self, request: TextRequest) -> Result<String, AiError> {
        self.text_requests.lock().push(request);
        self.text_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Transport("no scripted text response".to_string())))
    }

    async fn generate_images(&self, request: ImageRequest) -> Result<Vec<String>, AiError> {
        self.image_requests.lock().push(request);
        self.image_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Transport("no scripted image response".to_string())))
    }
}
