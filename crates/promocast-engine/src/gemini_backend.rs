use crate::backend_trait::GenerationBackend;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use promocast_core::{
    ApiKey, AssetResponse, GenerationError, GenerationOperation, OperationFailure, SpeechRequest,
    VideoRequest,
};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";
pub const DEFAULT_ASPECT_RATIO: &str = "9:16";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiBackend {
    client: Client,
    base_url: String,
    speech_model: String,
    text_model: String,
    video_model: String,
    aspect_ratio: String,
}

impl GeminiBackend {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{model}:{method}", self.base_url)
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        key: &ApiKey,
        body: &serde_json::Value,
    ) -> Result<T, GenerationError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, key.expose())
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn generate_content(
        &self,
        model: &str,
        key: &ApiKey,
        body: &serde_json::Value,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = self.model_url(model, "generateContent");
        self.post_json(&url, key, body).await
    }
}

impl Default for GeminiBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// The request URL is stripped: asset URLs carry the credential as a query
/// parameter.
fn transport(e: reqwest::Error) -> GenerationError {
    GenerationError::Transport(e.without_url().to_string())
}

async fn read_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, GenerationError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(GenerationError::Api {
            status: status.as_u16(),
            message: api_error_message(&text),
        });
    }
    let text = response.text().await.map_err(transport)?;
    serde_json::from_str(&text).map_err(|e| GenerationError::MalformedResponse(e.to_string()))
}

/// Pull `error.message` out of an error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| e.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}

fn speech_body(request: &SpeechRequest) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": request.text }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": request.voice }
                }
            }
        }
    })
}

fn text_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }]
    })
}

fn image_text_body(prompt: &str, image: &[u8], mime_type: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{
            "parts": [
                {
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": general_purpose::STANDARD.encode(image),
                    }
                },
                { "text": prompt }
            ]
        }]
    })
}

fn video_body(request: &VideoRequest, aspect_ratio: &str) -> serde_json::Value {
    serde_json::json!({
        "instances": [{
            "prompt": request.prompt,
            "image": {
                "bytesBase64Encoded": general_purpose::STANDARD.encode(&request.image),
                "mimeType": request.mime_type,
            }
        }],
        "parameters": {
            "aspectRatio": aspect_ratio,
            "sampleCount": 1
        }
    })
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: Option<String>,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    fn audio_data(self) -> Option<String> {
        self.first_parts()
            .first()
            .and_then(|p| p.inline_data.as_ref())
            .and_then(|d| d.data.clone())
            .filter(|d| !d.is_empty())
    }

    fn text(&self) -> Option<String> {
        let joined: String = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if joined.trim().is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

#[derive(Debug, Deserialize)]
struct OperationWire {
    name: String,
    #[serde(default)]
    done: bool,
    response: Option<OperationResponse>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
    #[serde(default)]
    generated_videos: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    uri: Option<String>,
}

impl From<OperationWire> for GenerationOperation {
    fn from(wire: OperationWire) -> Self {
        let asset_uri = wire.response.and_then(|r| {
            let samples = match r.generate_video_response {
                Some(v) if !v.generated_samples.is_empty() => v.generated_samples,
                _ => r.generated_videos,
            };
            samples
                .into_iter()
                .next()
                .and_then(|s| s.video)
                .and_then(|v| v.uri)
                .filter(|u| !u.is_empty())
        });
        GenerationOperation {
            name: wire.name,
            done: wire.done,
            asset_uri,
            failure: wire.error.map(|e| OperationFailure {
                code: e.code,
                message: e.message,
            }),
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), GenerationError> {
        let get = |field: &str| config.get(field).and_then(|v| v.as_str()).map(str::to_string);

        if let Some(base_url) = get("base_url") {
            self.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("speech_model") {
            self.speech_model = model;
        }
        if let Some(model) = get("text_model") {
            self.text_model = model;
        }
        if let Some(model) = get("video_model") {
            self.video_model = model;
        }
        if let Some(ratio) = get("aspect_ratio") {
            self.aspect_ratio = ratio;
        }
        let timeout_secs = config
            .get("request_timeout_secs")
            .and_then(|v| v.as_integer())
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        self.client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GenerationError::InitializationFailed(e.to_string()))?;

        tracing::info!(
            base_url = %self.base_url,
            speech_model = %self.speech_model,
            text_model = %self.text_model,
            video_model = %self.video_model,
            "GeminiBackend initialized"
        );
        Ok(())
    }

    async fn synthesize_speech(
        &self,
        key: &ApiKey,
        request: &SpeechRequest,
    ) -> Result<Option<String>, GenerationError> {
        let response = self
            .generate_content(&self.speech_model, key, &speech_body(request))
            .await?;
        Ok(response.audio_data())
    }

    async fn generate_text(
        &self,
        key: &ApiKey,
        prompt: &str,
    ) -> Result<Option<String>, GenerationError> {
        let response = self
            .generate_content(&self.text_model, key, &text_body(prompt))
            .await?;
        Ok(response.text())
    }

    async fn generate_text_from_image(
        &self,
        key: &ApiKey,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Option<String>, GenerationError> {
        let response = self
            .generate_content(&self.text_model, key, &image_text_body(prompt, image, mime_type))
            .await?;
        Ok(response.text())
    }

    async fn submit_video_job(
        &self,
        key: &ApiKey,
        request: &VideoRequest,
    ) -> Result<GenerationOperation, GenerationError> {
        let url = self.model_url(&self.video_model, "predictLongRunning");
        let wire: OperationWire = self
            .post_json(&url, key, &video_body(request, &self.aspect_ratio))
            .await?;
        tracing::info!(operation = %wire.name, "video job submitted");
        Ok(wire.into())
    }

    async fn poll_video_job(
        &self,
        key: &ApiKey,
        operation: &GenerationOperation,
    ) -> Result<GenerationOperation, GenerationError> {
        let url = format!("{}/v1beta/{}", self.base_url, operation.name);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, key.expose())
            .send()
            .await
            .map_err(transport)?;
        let wire: OperationWire = read_json(response).await?;
        Ok(wire.into())
    }

    async fn fetch_asset(&self, url: &str) -> Result<AssetResponse, GenerationError> {
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        let body = if status.is_success() {
            response.bytes().await.map_err(transport)?.to_vec()
        } else {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "asset download failed: {text}");
            text.into_bytes()
        };
        Ok(AssetResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}
