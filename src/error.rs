//! Failure classification
//!
//! Every failed user action ends up in one `ErrorKind`, which selects the
//! HTTP status and the localized message shown to the user. Rate limiting is
//! read from the typed `AiError` first; the message text is only inspected as
//! a fallback for errors that lost their type on the way.

use serde::Serialize;

use crate::gemini::AiError;
use crate::locale::{self, Action, Locale};
use crate::riddle::RiddleError;
use crate::store::StoreError;

/// Markers the AI service uses when throttling
pub const RATE_LIMIT_MARKERS: [&str; 3] = ["429", "RESOURCE_EXHAUSTED", "Quota exceeded"];

/// Category of a failed action, as reported to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The AI service is throttling requests
    RateLimited,
    /// Any other AI or transport failure
    Failed,
    /// The image model returned nothing
    NoImages,
    /// Unknown theme, riddle or image
    NotFound,
    /// The same action is already running
    Busy,
    /// The persisted document could not be read or written
    Storage,
}

/// Whether an error message carries a rate-limit marker
pub fn has_rate_limit_marker(message: &str) -> bool {
    RATE_LIMIT_MARKERS.iter().any(|m| message.contains(m))
}

/// Whether an AI error means the service is throttling
pub fn is_rate_limited(err: &AiError) -> bool {
    matches!(err, AiError::RateLimited(_)) || has_rate_limit_marker(&err.to_string())
}

/// Errors raised while serving a user action
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("unknown theme: {0}")]
    UnknownTheme(u32),

    #[error("riddle #{riddle_number} not found in theme {theme_id}")]
    RiddleNotFound { theme_id: u32, riddle_number: u32 },

    #[error("image not found: {0}")]
    ImageNotFound(String),

    #[error("{0:?} already in progress")]
    Busy(Action),

    #[error("{action:?} failed: {source}")]
    Action {
        action: Action,
        #[source]
        source: RiddleError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Classify the failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::UnknownTheme(_)
            | ServiceError::RiddleNotFound { .. }
            | ServiceError::ImageNotFound(_) => ErrorKind::NotFound,
            ServiceError::Busy(_) => ErrorKind::Busy,
            ServiceError::Action {
                source: RiddleError::NoImages,
                ..
            } => ErrorKind::NoImages,
            ServiceError::Action { source, .. } if source.is_rate_limited() => {
                ErrorKind::RateLimited
            }
            ServiceError::Action { .. } => ErrorKind::Failed,
            ServiceError::Store(_) => ErrorKind::Storage,
        }
    }

    /// Message shown to the user
    ///
    /// Storage failures are not localized and carry the raw error.
    pub fn user_message(&self, locale: Locale) -> String {
        match (self.kind(), self) {
            (ErrorKind::RateLimited, _) => locale::rate_limited(locale).to_string(),
            (ErrorKind::NoImages, _) => locale::no_images(locale).to_string(),
            (ErrorKind::Failed, ServiceError::Action { action, .. }) => {
                locale::failed(*action, locale).to_string()
            }
            (ErrorKind::NotFound, _) => locale::not_found(locale).to_string(),
            (ErrorKind::Busy, _) => locale::busy(locale).to_string(),
            _ => self.to_string(),
        }
    }
}
