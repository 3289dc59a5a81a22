//! Riddle image requests

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use super::{Riddle, RiddleError, RiddlePipeline};
use crate::gemini::ImageRequest;

/// Variations requested per riddle
pub const IMAGE_COUNT: u32 = 2;

/// Portrait output
pub const IMAGE_ASPECT_RATIO: &str = "9:16";

/// Output encoding
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").unwrap());

/// Build the image prompt: the description verbatim plus fixed art direction
pub fn image_prompt(description: &str) -> String {
    format!(
        r#"
**Primary Goal:** Create a digital masterpiece that is both a work of art and a visual riddle.

**Core Description:**
"{}"

**Artistic Directives:**
- **Style:** Photorealistic with a touch of surrealism. Imagine a still from a cinematic masterpiece by a visionary director.
- **Quality:** Masterpiece, 8K resolution, ultra-high detail (UHD), intricate textures.
- **Lighting:** Dramatic, cinematic lighting. Employ techniques like chiaroscuro, with deep, mysterious shadows and striking highlights that guide the viewer's eye towards the hidden details of the riddle.
- **Mood & Atmosphere:** Ethereal, mysterious, enigmatic, and profoundly atmospheric. The image should evoke a sense of wonder and curiosity.
- **Composition:** A meticulously crafted composition following the rule of thirds. The scene should feel balanced yet intriguing.
- **Rendering:** Render as if using Unreal Engine 5, achieving hyperrealism.
"#,
        description
    )
}

/// File name offered when downloading image `index` (0-based) of a riddle
pub fn download_filename(riddle: &Riddle, index: usize) -> String {
    format!(
        "{}_R{}_img{}.jpeg",
        WHITESPACE_REGEX.replace_all(&riddle.title, "_"),
        riddle.riddle_number,
        index + 1
    )
}

impl RiddlePipeline {
    /// Request images for a riddle, as base64 payloads
    ///
    /// An empty answer is reported as `RiddleError::NoImages`, which usually
    /// means the prompt was rejected by the safety filter.
    pub async fn request_images(&self, riddle: &Riddle) -> Result<Vec<String>, RiddleError> {
        let request = ImageRequest {
            model: self.image_model.clone(),
            prompt: image_prompt(&riddle.description),
            count: IMAGE_COUNT,
            aspect_ratio: IMAGE_ASPECT_RATIO.to_string(),
            mime_type: IMAGE_MIME_TYPE.to_string(),
        };

        let images = self.backend.generate_images(request).await?;

        if images.is_empty() {
            warn!(
                "Image model returned no images for riddle #{}",
                riddle.riddle_number
            );
            return Err(RiddleError::NoImages);
        }

        info!(
            "Generated {} images for riddle #{}",
            images.len(),
            riddle.riddle_number
        );
        Ok(images)
    }
}
