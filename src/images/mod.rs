//! Image storage and generation module
//!
//! Provides:
//! - Content-addressed image storage
//! - Riddle image generation pipeline

mod gen;
mod store;

pub use gen::{generate_riddle_images, SavedImage};
pub use store::{ImageStore, StoredImage};
