use async_trait::async_trait;
use promocast_core::{
    ApiKey, AssetResponse, GenerationError, GenerationOperation, SpeechRequest, VideoRequest,
};

/// The remote generation API: speech synthesis, text generation and the
/// long-running video job protocol.
///
/// Implementations are registered via [`BackendRegistry`](crate::BackendRegistry)
/// and configured once through [`initialize`](Self::initialize). Every call
/// receives the credential explicitly; backends never cache it.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Returns the backend's registry name (e.g. `"gemini"`, `"null"`).
    fn name(&self) -> &str;
    /// One-time initialisation with the backend's `[backends.<name>]` table.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), GenerationError>;
    /// Returns the base64 PCM payload, or `None` when the response carried no audio.
    async fn synthesize_speech(
        &self,
        key: &ApiKey,
        request: &SpeechRequest,
    ) -> Result<Option<String>, GenerationError>;
    /// Returns the model's text, or `None` when the response was empty.
    async fn generate_text(&self, key: &ApiKey, prompt: &str)
        -> Result<Option<String>, GenerationError>;
    /// Text generation with an inline image as additional input.
    async fn generate_text_from_image(
        &self,
        key: &ApiKey,
        prompt: &str,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Option<String>, GenerationError>;
    async fn submit_video_job(
        &self,
        key: &ApiKey,
        request: &VideoRequest,
    ) -> Result<GenerationOperation, GenerationError>;
    /// Re-fetch `operation` by its name.
    async fn poll_video_job(
        &self,
        key: &ApiKey,
        operation: &GenerationOperation,
    ) -> Result<GenerationOperation, GenerationError>;
    /// GET an already-authenticated asset URL. Non-2xx statuses are returned,
    /// not turned into errors; only transport faults fail.
    async fn fetch_asset(&self, url: &str) -> Result<AssetResponse, GenerationError>;
}
