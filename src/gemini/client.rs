//! Gemini REST client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AiError, GeminiConfig, GenerativeBackend, ImageRequest, TextRequest};

/// Gemini / Imagen client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    /// HTTP client
    client: Client,
    /// API key
    api_key: Option<String>,
    /// API base URL
    base_url: String,
}

impl GeminiClient {
    /// Create a new client from settings
    pub fn new(config: &GeminiConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AiError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check if API key is configured
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        body: &B,
    ) -> Result<R, AiError> {
        let api_key = self.api_key.as_ref().ok_or(AiError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{}/models/{}:{}", self.base_url, model, method))
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API error: {} - {}", status, body);
            return Err(map_http_error(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| AiError::MalformedResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_text(&self, request: TextRequest) -> Result<String, AiError> {
        let structured = request.response_schema.is_some();
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt,
                }],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: request.system_instruction,
                }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: structured.then(|| "application/json".to_string()),
                response_schema: request.response_schema,
            },
        };

        debug!(
            "Sending generateContent request: model={} structured={}",
            request.model, structured
        );

        let response: GenerateContentResponse =
            self.post(&request.model, "generateContent", &body).await?;
        extract_text(response)
    }

    async fn generate_images(&self, request: ImageRequest) -> Result<Vec<String>, AiError> {
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: request.prompt,
            }],
            parameters: PredictParameters {
                sample_count: request.count,
                aspect_ratio: request.aspect_ratio,
                output_options: OutputOptions {
                    mime_type: request.mime_type,
                },
            },
        };

        debug!(
            "Sending predict request: model={} count={}",
            request.model, body.parameters.sample_count
        );

        let response: PredictResponse = self.post(&request.model, "predict", &body).await?;

        Ok(response
            .predictions
            .into_iter()
            .filter_map(|p| p.bytes_base64_encoded)
            .collect())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_options: OutputOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions {
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: GenerateContentResponse) -> Result<String, AiError> {
    let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);

    let text: Option<String> = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect());

    match text {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(AiError::MalformedResponse(match block_reason {
            Some(reason) => format!("prompt blocked: {}", reason),
            None => "no text in response candidates".to_string(),
        })),
    }
}

/// Map a non-success response to a typed error
fn map_http_error(status: StatusCode, body: &str) -> AiError {
    let (status_text, message) = match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => (
            wrapper.error.status.unwrap_or_default(),
            wrapper.error.message.unwrap_or_else(|| body.to_string()),
        ),
        Err(_) => (String::new(), body.to_string()),
    };

    let message = if status_text.is_empty() {
        message
    } else {
        format!("{}: {}", status_text, message)
    };

    if status == StatusCode::TOO_MANY_REQUESTS || status_text == "RESOURCE_EXHAUSTED" {
        AiError::RateLimited(message)
    } else {
        AiError::Service {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_request_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: "prompt".to_string(),
                }],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: "system".to_string(),
                }],
            }),
            generation_config: GenerationConfig {
                temperature: 0.5,
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(json!({"type": "OBJECT"})),
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "system");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(value["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_free_text_request_omits_schema() {
        let config = GenerationConfig {
            temperature: 0.7,
            response_mime_type: None,
            response_schema: None,
        };
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("responseMimeType").is_none());
        assert!(value.get("responseSchema").is_none());
    }

    #[test]
    fn test_predict_request_shape() {
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: "a tree".to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 2,
                aspect_ratio: "9:16".to_string(),
                output_options: OutputOptions {
                    mime_type: "image/jpeg".to_string(),
                },
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["parameters"]["sampleCount"], 2);
        assert_eq!(value["parameters"]["aspectRatio"], "9:16");
        assert_eq!(
            value["parameters"]["outputOptions"]["mimeType"],
            "image/jpeg"
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "Hello, "}, {"text": "world"}]}}]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Hello, world");
    }

    #[test]
    fn test_extract_text_blocked() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        match extract_text(response) {
            Err(AiError::MalformedResponse(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_predict_response_skips_filtered() {
        let response: PredictResponse = serde_json::from_value(json!({
            "predictions": [
                {"bytesBase64Encoded": "AAAA", "mimeType": "image/jpeg"},
                {"raiFilteredReason": "filtered"}
            ]
        }))
        .unwrap();
        let images: Vec<String> = response
            .predictions
            .into_iter()
            .filter_map(|p| p.bytes_base64_encoded)
            .collect();
        assert_eq!(images, vec!["AAAA".to_string()]);

        let empty: PredictResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.predictions.is_empty());
    }

    #[test]
    fn test_map_http_error_rate_limited() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#,
        );
        match err {
            AiError::RateLimited(msg) => {
                assert_eq!(msg, "RESOURCE_EXHAUSTED: Quota exceeded")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_map_http_error_service() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream down");
        match err {
            AiError::Service { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_client() {
        let client = GeminiClient::new(&GeminiConfig::default()).unwrap();
        assert!(!client.is_configured());

        let result = client
            .generate_images(ImageRequest {
                model: "imagen".to_string(),
                prompt: "p".to_string(),
                count: 2,
                aspect_ratio: "9:16".to_string(),
                mime_type: "image/jpeg".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AiError::NotConfigured)));
    }
}
