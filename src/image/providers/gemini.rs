//! Gemini (Google) image service.
//!
//! Edits go through the Gemini `generateContent` endpoint with the source
//! image inlined; generation goes through the Imagen `predict` endpoint.

use crate::encode;
use crate::error::{parse_retry_after, sanitize_error_message, Result, RetouchError};
use crate::image::provider::ImageService;
use crate::image::types::{
    ArtifactMetadata, EditRequest, GenerateRequest, ImageArtifact, ImageFormat,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini model variants used for image editing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    FlashImage,
    /// Gemini 3 Pro Image (highest quality).
    ProImage,
}

impl EditModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::ProImage => "gemini-3-pro-image-preview",
        }
    }
}

/// Imagen model variants used for text-to-image generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImagenModel {
    /// Imagen 4 (current generation).
    #[default]
    Imagen4,
    /// Imagen 3 (previous generation).
    Imagen3,
}

impl ImagenModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imagen4 => "imagen-4.0-generate-001",
            Self::Imagen3 => "imagen-3.0-generate-002",
        }
    }
}

/// Builder for [`GeminiService`].
#[derive(Debug, Clone, Default)]
pub struct GeminiServiceBuilder {
    api_key: Option<String>,
    edit_model: EditModel,
    imagen_model: ImagenModel,
}

impl GeminiServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `GEMINI_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model used for edits.
    pub fn edit_model(mut self, model: EditModel) -> Self {
        self.edit_model = model;
        self
    }

    /// Sets the Imagen model used for generation.
    pub fn imagen_model(mut self, model: ImagenModel) -> Self {
        self.imagen_model = model;
        self
    }

    /// Builds the service, resolving the API key.
    pub fn build(self) -> Result<GeminiService> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                RetouchError::Auth("GEMINI_API_KEY not set and no API key provided".into())
            })?;

        Ok(GeminiService {
            client: reqwest::Client::new(),
            api_key,
            edit_model: self.edit_model,
            imagen_model: self.imagen_model,
        })
    }
}

/// Gemini-backed image service.
pub struct GeminiService {
    client: reqwest::Client,
    api_key: String,
    edit_model: EditModel,
    imagen_model: ImagenModel,
}

impl GeminiService {
    /// Creates a new `GeminiServiceBuilder`.
    pub fn builder() -> GeminiServiceBuilder {
        GeminiServiceBuilder::new()
    }

    async fn edit_impl(&self, request: &EditRequest) -> Result<ImageArtifact> {
        let start = Instant::now();
        let url = format!("{}/{}:generateContent", API_BASE, self.edit_model.as_str());

        let body = GeminiRequest::from_edit_request(request);

        tracing::info!(model = self.edit_model.as_str(), "dispatching edit request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        // Prompt-level blocks come back as HTTP 200
        if let Some(ref feedback) = gemini_response.prompt_feedback {
            if let Some(ref reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(RetouchError::ContentBlocked(msg));
            }
        }

        let candidate = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| {
                RetouchError::UnexpectedResponse("No candidates in Gemini response".into())
            })?;

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY"
                | "IMAGE_SAFETY"
                | "IMAGE_PROHIBITED_CONTENT"
                | "IMAGE_RECITATION"
                | "RECITATION"
                | "PROHIBITED_CONTENT"
                | "BLOCKLIST" => {
                    return Err(RetouchError::ContentBlocked(format!(
                        "Content blocked by Gemini safety filter: {}",
                        finish_reason
                    )));
                }
                "IMAGE_OTHER" | "NO_IMAGE" => {
                    return Err(RetouchError::UnexpectedResponse(format!(
                        "Edit failed: {}. Try a different instruction.",
                        finish_reason
                    )));
                }
                _ => {} // STOP, MAX_TOKENS, etc. are normal
            }
        }

        let content = candidate.content.ok_or_else(|| {
            RetouchError::UnexpectedResponse("No content in Gemini candidate".into())
        })?;

        let inline_data = content
            .parts
            .into_iter()
            .find_map(|p| p.inline_data)
            .ok_or_else(|| {
                RetouchError::UnexpectedResponse("No image data in Gemini response".into())
            })?;

        let data = encode::from_base64(&inline_data.data)?;

        self.artifact_from(data, &inline_data.mime_type, self.edit_model.as_str(), start)
    }

    async fn generate_impl(&self, request: &GenerateRequest) -> Result<ImageArtifact> {
        let start = Instant::now();
        let url = format!("{}/{}:predict", API_BASE, self.imagen_model.as_str());

        let body = ImagenRequest::from_generate_request(request);

        tracing::info!(
            model = self.imagen_model.as_str(),
            "dispatching generate request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let imagen_response: ImagenResponse = response.json().await?;

        let prediction = imagen_response
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| {
                RetouchError::UnexpectedResponse("No predictions in Imagen response".into())
            })?;

        let data = encode::from_base64(&prediction.bytes_base64_encoded)?;
        let mime = prediction.mime_type.as_deref().unwrap_or("image/png");

        self.artifact_from(data, mime, self.imagen_model.as_str(), start)
    }

    fn artifact_from(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        model: &str,
        start: Instant,
    ) -> Result<ImageArtifact> {
        let format = ImageFormat::from_mime(mime_type)
            .or_else(|| ImageFormat::from_magic_bytes(&data))
            .unwrap_or_default();

        Ok(ImageArtifact::new(
            data,
            format,
            ArtifactMetadata {
                model: Some(model.to_string()),
                duration_ms: Some(start.elapsed().as_millis() as u64),
            },
        ))
    }

    fn parse_error(
        &self,
        status: u16,
        text: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> RetouchError {
        let text = sanitize_error_message(text);
        if status == 429 {
            let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
            return RetouchError::RateLimited { retry_after };
        }
        if status == 401 || status == 403 {
            return RetouchError::Auth(text);
        }
        if status == 404 {
            return RetouchError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            );
        }
        let lower = text.to_lowercase();
        if lower.contains("safety")
            || lower.contains("blocked")
            || lower.contains("content_policy")
            || lower.contains("prohibited")
        {
            return RetouchError::ContentBlocked(text);
        }
        RetouchError::Api {
            status,
            message: text,
        }
    }
}

#[async_trait]
impl ImageService for GeminiService {
    async fn edit(&self, request: &EditRequest) -> Result<ImageArtifact> {
        self.edit_impl(request).await
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<ImageArtifact> {
        self.generate_impl(request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/{}", API_BASE, self.edit_model.as_str());

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(RetouchError::Auth("Invalid API key".into())),
            404 => Err(RetouchError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(RetouchError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request/Response types - generateContent (edit)

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - either inline image data or text.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    InlineData { inline_data: GeminiInlineData },
    Text { text: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_edit_request(req: &EditRequest) -> Self {
        // Source image precedes the instruction
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.mime_type.clone(),
                    data: req.image_b64.clone(),
                },
            },
            GeminiRequestPart::Text {
                text: req.instruction.clone(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

// Request/Response types - predict (generate)

#[derive(Debug, Serialize)]
struct ImagenRequest {
    instances: Vec<ImagenInstance>,
    parameters: ImagenParameters,
}

#[derive(Debug, Serialize)]
struct ImagenInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters {
    sample_count: u32,
}

impl ImagenRequest {
    fn from_generate_request(req: &GenerateRequest) -> Self {
        Self {
            instances: vec![ImagenInstance {
                prompt: req.instruction.clone(),
            }],
            parameters: ImagenParameters { sample_count: 1 },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagenResponse {
    #[serde(default)]
    predictions: Vec<ImagenPrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagenPrediction {
    bytes_base64_encoded: String,
    #[serde(default)]
    mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> GeminiService {
        GeminiService::builder().api_key("test-key").build().unwrap()
    }

    #[test]
    fn test_model_identifiers() {
        assert_eq!(EditModel::FlashImage.as_str(), "gemini-2.5-flash-image");
        assert_eq!(ImagenModel::Imagen4.as_str(), "imagen-4.0-generate-001");
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let service = GeminiServiceBuilder::new()
            .api_key("test-key")
            .edit_model(EditModel::ProImage)
            .build();
        assert!(service.is_ok());
    }

    #[test]
    fn test_edit_request_body_ordering() {
        let req = EditRequest {
            image_b64: "aGVsbG8=".into(),
            mime_type: "image/png".into(),
            instruction: "Add a sunset".into(),
        };
        let body = GeminiRequest::from_edit_request(&req);

        // Image part first, then the instruction
        assert_eq!(body.contents.len(), 1);
        assert_eq!(body.contents[0].parts.len(), 2);
        assert!(matches!(
            body.contents[0].parts[0],
            GeminiRequestPart::InlineData { .. }
        ));
        assert!(matches!(
            body.contents[0].parts[1],
            GeminiRequestPart::Text { .. }
        ));
        assert_eq!(body.generation_config.response_modalities, vec!["IMAGE"]);
    }

    #[test]
    fn test_edit_request_body_uses_camel_case() {
        let req = EditRequest {
            image_b64: "aGVsbG8=".into(),
            mime_type: "image/png".into(),
            instruction: "Add a sunset".into(),
        };
        let body = GeminiRequest::from_edit_request(&req);
        let json = serde_json::to_value(&body).unwrap();

        assert!(json.get("generationConfig").is_some());
        assert!(json.get("generation_config").is_none());
        let part = &json["contents"][0]["parts"][0];
        assert_eq!(part["inline_data"]["mimeType"], "image/png");
    }

    #[test]
    fn test_imagen_request_body() {
        let req = GenerateRequest::new("An astronaut riding a horse on Mars");
        let body = ImagenRequest::from_generate_request(&req);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json["instances"][0]["prompt"],
            "An astronaut riding a horse on Mars"
        );
        assert_eq!(json["parameters"]["sampleCount"], 1);
    }

    #[test]
    fn test_gemini_response_deserialization() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{
                        "inlineData": {
                            "mimeType": "image/png",
                            "data": "iVBORw0KGgo="
                        }
                    }]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.candidates.len(), 1);
        assert_eq!(resp.candidates[0].finish_reason.as_deref(), Some("STOP"));

        let content = resp.candidates[0].content.as_ref().unwrap();
        let inline = content.parts[0].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "image/png");
    }

    #[test]
    fn test_gemini_response_with_prompt_feedback_block() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(resp.candidates.is_empty());
        let feedback = resp.prompt_feedback.unwrap();
        assert_eq!(feedback.block_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn test_imagen_response_deserialization() {
        let json = r#"{
            "predictions": [{
                "bytesBase64Encoded": "iVBORw0KGgo=",
                "mimeType": "image/png"
            }]
        }"#;
        let resp: ImagenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.predictions.len(), 1);
        assert_eq!(
            resp.predictions[0].mime_type.as_deref(),
            Some("image/png")
        );
    }

    #[test]
    fn test_parse_error_auth() {
        let service = test_service();
        let headers = reqwest::header::HeaderMap::new();
        let err = service.parse_error(403, r#"{"error":{"message":"bad key"}}"#, &headers);
        assert!(matches!(err, RetouchError::Auth(_)));
    }

    #[test]
    fn test_parse_error_rate_limited_with_hint() {
        let service = test_service();
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "15".parse().unwrap());
        let err = service.parse_error(429, "", &headers);
        match err {
            RetouchError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(std::time::Duration::from_secs(15)));
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_safety_keyword() {
        let service = test_service();
        let headers = reqwest::header::HeaderMap::new();
        let err = service.parse_error(
            400,
            r#"{"error":{"message":"Request blocked by safety policy"}}"#,
            &headers,
        );
        assert!(matches!(err, RetouchError::ContentBlocked(_)));
    }

    #[test]
    fn test_parse_error_generic_api() {
        let service = test_service();
        let headers = reqwest::header::HeaderMap::new();
        let err = service.parse_error(500, r#"{"error":{"message":"internal"}}"#, &headers);
        match err {
            RetouchError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal");
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }
}
