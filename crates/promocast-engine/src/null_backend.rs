use crate::backend_trait::GenerationBackend;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use promocast_core::{
    ApiKey, AssetResponse, GenerationError, GenerationOperation, SpeechRequest, VideoRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Quarter of a second of silence at 24 kHz, 16-bit mono.
const SILENCE_BYTES: usize = 12_000;
const ASSET_SCHEME: &str = "null://asset/";
pub const NULL_VIDEO_BYTES: &[u8] = b"null-video";

/// Offline backend: silent speech, echo text, and video jobs that finish
/// after a single poll.
pub struct NullBackend {
    submit_count: AtomicUsize,
    poll_count: AtomicUsize,
}

impl NullBackend {
    pub fn new() -> Self {
        Self {
            submit_count: AtomicUsize::new(0),
            poll_count: AtomicUsize::new(0),
        }
    }

    pub fn submit_count(&self) -> usize {
        self.submit_count.load(Ordering::Relaxed)
    }

    pub fn poll_count(&self) -> usize {
        self.poll_count.load(Ordering::Relaxed)
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    async fn initialize(&mut self, _config: toml::Value) -> Result<(), GenerationError> {
        Ok(())
    }

    async fn synthesize_speech(
        &self,
        _key: &ApiKey,
        request: &SpeechRequest,
    ) -> Result<Option<String>, GenerationError> {
        tracing::trace!(voice = %request.voice, "NullBackend synthesizing silence");
        Ok(Some(general_purpose::STANDARD.encode(vec![0u8; SILENCE_BYTES])))
    }

    async fn generate_text(
        &self,
        _key: &ApiKey,
        prompt: &str,
    ) -> Result<Option<String>, GenerationError> {
        Ok(Some(format!("[null] {} prompt chars", prompt.chars().count())))
    }

    async fn generate_text_from_image(
        &self,
        _key: &ApiKey,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Option<String>, GenerationError> {
        Ok(Some(format!(
            "[null] {} prompt chars, {} byte {mime_type}",
            prompt.chars().count(),
            image.len()
        )))
    }

    async fn submit_video_job(
        &self,
        _key: &ApiKey,
        _request: &VideoRequest,
    ) -> Result<GenerationOperation, GenerationError> {
        let n = self.submit_count.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(GenerationOperation::pending(format!("operations/null-{n}")))
    }

    async fn poll_video_job(
        &self,
        _key: &ApiKey,
        operation: &GenerationOperation,
    ) -> Result<GenerationOperation, GenerationError> {
        self.poll_count.fetch_add(1, Ordering::Relaxed);
        let id = operation.name.rsplit('/').next().unwrap_or_default();
        Ok(GenerationOperation::finished(
            operation.name.clone(),
            Some(format!("{ASSET_SCHEME}{id}?alt=media")),
        ))
    }

    async fn fetch_asset(&self, url: &str) -> Result<AssetResponse, GenerationError> {
        if url.starts_with(ASSET_SCHEME) {
            Ok(AssetResponse {
                status: 200,
                status_text: "OK".to_string(),
                body: NULL_VIDEO_BYTES.to_vec(),
            })
        } else {
            Ok(AssetResponse {
                status: 404,
                status_text: "Not Found".to_string(),
                body: Vec::new(),
            })
        }
    }
}
