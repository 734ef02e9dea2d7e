// Gemini generateContent client — plain REST over reqwest.
//
// No vendor SDK: the endpoint is a single POST with a JSON body, and a
// thin client keeps the dependency surface small and the error messages
// inspectable (the retry layer sniffs them for overload markers).
//
// API docs: https://ai.google.dev/api/generate-content

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keys::ApiKey;

use super::traits::{ImageGenerator, TextGenerator};

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for text generation.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-pro";

/// Default model for image generation.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-exp-image-generation";

/// Thin HTTP client for the generateContent endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    /// Create a client pointing at the given base URL and models.
    ///
    /// Pass a different base URL for testing against a local stub.
    pub fn new(base_url: &str, text_model: &str, image_model: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("ember/0.1 (thread-studio)")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            text_model: text_model.to_string(),
            image_model: image_model.to_string(),
        })
    }

    /// POST a generateContent request and deserialize the response.
    ///
    /// The credential travels as a query parameter; the key itself is never
    /// logged. Non-2xx responses bail with the status and body so the retry
    /// layer can recognize overload errors from the message.
    async fn generate_content(
        &self,
        model: &str,
        key: &ApiKey,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        debug!(model = model, key = %key, "generateContent request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", key.expose())])
            .json(request)
            .send()
            .await
            .with_context(|| format!("generateContent request failed: {model}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("generateContent ({model}) returned {status}: {body}");
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .context("Failed to parse generateContent response")
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, key: &ApiKey) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            generation_config: None,
        };

        let response = self
            .generate_content(&self.text_model, key, &request)
            .await?;

        let text = response.text_parts();
        if text.is_empty() {
            anyhow::bail!("generateContent response carried no text parts");
        }
        Ok(text)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(&self, prompt: &str, key: &ApiKey) -> Result<Option<Vec<u8>>> {
        // Image models want both modalities requested even when only the
        // image part is consumed.
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt)],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            }),
        };

        let response = self
            .generate_content(&self.image_model, key, &request)
            .await?;

        match response.first_inline_data() {
            Some(data) => {
                let bytes = BASE64
                    .decode(data)
                    .context("Failed to decode inline image data")?;
                Ok(Some(bytes))
            }
            None => Ok(None),
        }
    }
}

// --- generateContent request/response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(value: &str) -> Self {
        Self {
            text: Some(value.to_string()),
            inline_data: None,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenate every text part of the first candidate.
    fn text_parts(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    /// The first inline (base64) data payload of the first candidate.
    fn first_inline_data(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| {
                content
                    .parts
                    .iter()
                    .find_map(|p| p.inline_data.as_ref().map(|d| d.data.as_str()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_parts_concatenated() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "hot take: "}, {"text": "threads rule"}]}}
            ]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text_parts(), "hot take: threads rule");
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.text_parts(), "");
        assert!(response.first_inline_data().is_none());
    }

    #[test]
    fn test_response_inline_data_found_after_text() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [
                    {"text": "here is your image"},
                    {"inlineData": {"mimeType": "image/png", "data": "aGVsbG8="}}
                ]}}
            ]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_inline_data(), Some("aGVsbG8="));
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text("hi")],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["responseModalities"][0], "TEXT");
    }

    #[test]
    fn test_request_omits_absent_generation_config() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text("hi")],
            }],
            generation_config: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("generationConfig").is_none());
    }
}
