//! Next-riddle generation

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{Riddle, RiddleError, RiddlePipeline};
use crate::gemini::{AiError, TextRequest};
use crate::theme::Theme;

/// Maximum characters of the previous description quoted as context
pub const CONTEXT_EXCERPT_CHARS: usize = 150;

const GENERATION_TEMPERATURE: f32 = 0.95;

/// Result of a generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedRiddle {
    pub riddle: Riddle,
    /// Number the model claimed when it differed from the assigned one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_from: Option<Value>,
}

/// Structured model output; the number is checked before it becomes a `Riddle`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelRiddle {
    /// Kept raw: whatever the model put here is replaced
    #[serde(default)]
    riddle_number: Option<Value>,
    title: String,
    description: String,
    solution: String,
}

/// Schema the text model must follow
fn riddle_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "riddleNumber": { "type": "NUMBER" },
            "title": { "type": "STRING" },
            "description": { "type": "STRING" },
            "solution": { "type": "STRING" }
        },
        "required": ["riddleNumber", "title", "description", "solution"]
    })
}

/// Summarize the last riddle of a history for the next prompt
pub fn previous_riddle_context(history: &[Riddle]) -> String {
    let Some(last) = history.last() else {
        return "This is the first artistic riddle in the series.".to_string();
    };

    let excerpt: String = last.description.chars().take(CONTEXT_EXCERPT_CHARS).collect();

    format!(
        r#"
Context from the previous artwork (Riddle #{}):
- Title: {}
- Brief Idea: {}...

Please create a new, distinct artistic riddle that fits the theme.
"#,
        last.riddle_number, last.title, excerpt
    )
}

fn system_instruction(riddle_number: u32) -> String {
    format!(
        r#"You are a master of artistic riddles, a digital muse that inspires breathtaking, mysterious art. Your task is to generate a concept for a single, profound piece of art based on a given theme.

Instructions:
1.  **Format:** The output must be a valid JSON object that strictly adheres to the provided schema.
2.  **Riddle Number:** The riddle number must be {riddle_number}.
3.  **Content Guidelines:**
    *   **Title:** Create a short, evocative, and mysterious title for the artwork.
    *   **Description:** This is the most important part. Write a rich, highly detailed visual description of a scene. This description will be fed directly into an AI image generator. It must contain a hidden visual riddle or puzzle. Be poetic and specific about lighting, colors, composition, and mood (e.g., "A colossal, bioluminescent tree in a silent, misty forest at midnight. Its roots, glowing with soft amber light, subtly form a question mark shape around a forgotten, moss-covered sundial. The riddle is to figure out what time the sundial shows, but the moon is the only light source.").
    *   **Solution:** Clearly and concisely state the solution to the riddle hidden in the description.
4.  **Language:** Respond entirely in the same language as the user's request (e.g., if the concept is in Arabic, the entire response must be in Arabic).
"#
    )
}

fn user_prompt(theme: &Theme, riddle_number: u32, context: &str) -> String {
    format!(
        r#"
Generate the next artistic riddle concept (Riddle #{riddle_number}) for the following theme.

**Theme Title:** {}
**Theme Description:** {}

{context}

Generate Riddle #{riddle_number} now.
"#,
        theme.title, theme.description
    )
}

impl RiddlePipeline {
    /// Generate the riddle following `history` for `theme`
    ///
    /// The returned riddle always carries number `history.len() + 1`,
    /// whatever the model answered.
    pub async fn generate_next(
        &self,
        theme: &Theme,
        history: &[Riddle],
    ) -> Result<GeneratedRiddle, RiddleError> {
        let riddle_number = history.len() as u32 + 1;
        let context = previous_riddle_context(history);

        info!(
            "Generating riddle #{} for theme {}",
            riddle_number, theme.id
        );

        let request = TextRequest {
            model: self.text_model.clone(),
            prompt: user_prompt(theme, riddle_number, &context),
            system_instruction: system_instruction(riddle_number),
            response_schema: Some(riddle_schema()),
            temperature: GENERATION_TEMPERATURE,
        };

        let text = self.backend.generate_text(request).await?;
        debug!("Model returned {} bytes of riddle JSON", text.len());

        let parsed: ModelRiddle = serde_json::from_str(text.trim()).map_err(|e| {
            AiError::MalformedResponse(format!("riddle does not match schema: {}", e))
        })?;

        let corrected_from = match parsed.riddle_number {
            Some(claimed) if claimed.as_f64() == Some(f64::from(riddle_number)) => None,
            None => {
                warn!("Model omitted the riddle number, assigning {}", riddle_number);
                None
            }
            Some(claimed) => {
                warn!(
                    "Model generated riddle {} but expected {}. Correcting.",
                    claimed, riddle_number
                );
                Some(claimed)
            }
        };

        Ok(GeneratedRiddle {
            riddle: Riddle {
                riddle_number,
                title: parsed.title,
                description: parsed.description,
                solution: parsed.solution,
            },
            corrected_from,
        })
    }
}
