//! Description refinement

use tracing::debug;

use super::{RiddleError, RiddlePipeline};
use crate::gemini::TextRequest;

const IMPROVE_TEMPERATURE: f32 = 0.7;

const IMPROVE_SYSTEM_INSTRUCTION: &str = r#"You are a world-class visual artist and poet. Your task is to take a given description for an artwork and elevate it to a masterpiece level.

Instructions:
1.  **Enhance, Don't Replace:** Do NOT change the core riddle or the solution hidden within the description.
2.  **Add Detail:** Elaborate on the atmosphere, lighting, textures, colors, and composition. Make it more cinematic and evocative.
3.  **Refine Language:** Use more powerful, poetic, and artistic language.
4.  **Output:** Return ONLY the improved description as a single string, without any preamble or explanation. The language must match the original description's language."#;

fn improve_prompt(description: &str) -> String {
    format!(
        r#"Improve the following artistic description. Make it more detailed and poetic, but keep the original riddle intact.

Original Description:
"{}"

Improved Description:"#,
        description
    )
}

impl RiddlePipeline {
    /// Rewrite a description more vividly, keeping its hidden riddle
    ///
    /// Whether the riddle survived is left to the model.
    pub async fn improve_description(&self, description: &str) -> Result<String, RiddleError> {
        let request = TextRequest {
            model: self.text_model.clone(),
            prompt: improve_prompt(description),
            system_instruction: IMPROVE_SYSTEM_INSTRUCTION.to_string(),
            response_schema: None,
            temperature: IMPROVE_TEMPERATURE,
        };

        let improved = self.backend.generate_text(request).await?;
        debug!(
            "Description improved: {} -> {} chars",
            description.chars().count(),
            improved.chars().count()
        );

        Ok(improved.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::gemini::stub::StubBackend;
    use crate::gemini::{AiError, GeminiConfig};

    #[tokio::test]
    async fn test_improve_trims_and_sends_free_text() {
        let stub = Arc::new(StubBackend::new());
        stub.push_text(Ok("\n  A luminous, misty forest.  \n".to_string()));
        let pipeline = RiddlePipeline::new(stub.clone(), &GeminiConfig::default());

        let improved = pipeline.improve_description("A forest.").await.unwrap();
        assert_eq!(improved, "A luminous, misty forest.");

        let request = stub.last_text_request().unwrap();
        assert!(request.response_schema.is_none());
        assert_eq!(request.temperature, 0.7);
        assert!(request.prompt.contains("\"A forest.\""));
        assert!(request.system_instruction.contains("Do NOT change the core riddle"));
    }

    #[tokio::test]
    async fn test_improve_propagates_error() {
        let stub = Arc::new(StubBackend::new());
        stub.push_text(Err(AiError::Service {
            status: 500,
            message: "INTERNAL".to_string(),
        }));
        let pipeline = RiddlePipeline::new(stub, &GeminiConfig::default());

        let err = pipeline.improve_description("A forest.").await.unwrap_err();
        assert!(!err.is_rate_limited());
    }
}
