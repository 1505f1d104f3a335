use promocast_audio::{wav_resource_from_base64, ResourceHandle, ResourceRegistry};
use promocast_core::prompts::{self, PriceTag, SpeakingStyle};
use promocast_core::types::{SUPPORTED_IMAGE_TYPES, VIDEO_CONTENT_TYPE};
use promocast_core::{ApiKey, CredentialProvider, GenerationError, SpeechRequest, VideoRequest};
use promocast_engine::{CancelSignal, GenerationBackend, OperationPoller, PollPolicy};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_VIDEO_PROMPT: &str = "animate this image";

/// User-triggered action kinds. At most one call per kind runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Speech,
    Video,
    Script,
    Caption,
    Optimize,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::Speech => "speech",
            Action::Video => "video",
            Action::Script => "script",
            Action::Caption => "caption",
            Action::Optimize => "optimize",
        }
    }
}

struct ActionGuard<'a> {
    in_flight: &'a Mutex<HashSet<Action>>,
    action: Action,
}

fn lock_in_flight(in_flight: &Mutex<HashSet<Action>>) -> MutexGuard<'_, HashSet<Action>> {
    // Only single inserts and removes happen under the lock
    match in_flight.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        lock_in_flight(self.in_flight).remove(&self.action);
    }
}

/// Entry point for the UI layer. One `Studio` is one logical session.
pub struct Studio {
    backend: Box<dyn GenerationBackend>,
    credentials: Arc<dyn CredentialProvider>,
    resources: ResourceRegistry,
    policy: PollPolicy,
    default_video_prompt: String,
    in_flight: Mutex<HashSet<Action>>,
}

impl Studio {
    pub fn new(
        backend: Box<dyn GenerationBackend>,
        credentials: Arc<dyn CredentialProvider>,
        resources: ResourceRegistry,
    ) -> Self {
        Self {
            backend,
            credentials,
            resources,
            policy: PollPolicy::default(),
            default_video_prompt: DEFAULT_VIDEO_PROMPT.to_string(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_video_prompt(mut self, prompt: &str) -> Self {
        if !prompt.trim().is_empty() {
            self.default_video_prompt = prompt.trim().to_string();
        }
        self
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn begin(&self, action: Action) -> Result<ActionGuard<'_>, GenerationError> {
        let mut set = lock_in_flight(&self.in_flight);
        if !set.insert(action) {
            tracing::warn!(action = action.name(), "rejected concurrent request");
            return Err(GenerationError::Busy(action.name()));
        }
        Ok(ActionGuard {
            in_flight: &self.in_flight,
            action,
        })
    }

    fn credential(&self) -> Result<ApiKey, GenerationError> {
        self.credentials
            .api_key()?
            .ok_or(GenerationError::MissingCredential)
    }

    /// Synthesize `text` with a prebuilt voice and return a WAV resource.
    pub async fn synthesize_to_wav(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<ResourceHandle, GenerationError> {
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyInput("text"));
        }
        let _guard = self.begin(Action::Speech)?;
        let key = self.credential()?;

        if prompts::find_voice(voice).is_none() {
            tracing::warn!(voice, "voice is not in the catalog, passing it through");
        }

        let request = SpeechRequest {
            text: text.to_string(),
            voice: voice.to_string(),
        };
        let audio = self
            .backend
            .synthesize_speech(&key, &request)
            .await?
            .ok_or(GenerationError::AudioGenerationEmpty)?;

        let handle = wav_resource_from_base64(&self.resources, &audio)?;
        tracing::info!(voice, url = %handle.url(), "speech synthesized");
        Ok(handle)
    }

    /// Like [`synthesize_to_wav`](Self::synthesize_to_wav) with a delivery
    /// instruction prepended to the text.
    pub async fn synthesize_with_style(
        &self,
        text: &str,
        voice: &str,
        style: SpeakingStyle,
    ) -> Result<ResourceHandle, GenerationError> {
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyInput("text"));
        }
        self.synthesize_to_wav(&style.apply(text), voice).await
    }

    pub async fn animate_image_to_video(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<ResourceHandle, GenerationError> {
        self.animate_image_to_video_with_cancel(image, mime_type, prompt, &CancelSignal::never())
            .await
    }

    /// Animate a still image. A blank `prompt` is replaced by the default
    /// instruction. `cancel` is honoured between polls.
    pub async fn animate_image_to_video_with_cancel(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
        cancel: &CancelSignal,
    ) -> Result<ResourceHandle, GenerationError> {
        check_image(image, mime_type)?;
        let _guard = self.begin(Action::Video)?;
        let key = self.credential()?;

        let prompt = match prompt.trim() {
            "" => self.default_video_prompt.clone(),
            p => p.to_string(),
        };
        let request = VideoRequest {
            image: image.to_vec(),
            mime_type: mime_type.to_string(),
            prompt,
        };

        let poller = OperationPoller::new(self.backend.as_ref(), self.policy);
        let video = poller.run(&key, &request, cancel).await?;

        let handle = self.resources.register(VIDEO_CONTENT_TYPE, video);
        tracing::info!(url = %handle.url(), "video generated");
        Ok(handle)
    }

    /// Short affiliate-promo script for a product category.
    pub async fn affiliate_script(
        &self,
        category: &str,
        price: &PriceTag,
    ) -> Result<String, GenerationError> {
        if category.trim().is_empty() {
            return Err(GenerationError::EmptyInput("category"));
        }
        if let PriceTag::Custom(custom) = price {
            if custom.trim().is_empty() {
                return Err(GenerationError::EmptyInput("custom price"));
            }
        }
        let _guard = self.begin(Action::Script)?;
        let key = self.credential()?;
        let prompt = prompts::affiliate_script_prompt(category.trim(), price);
        self.complete_text(&key, &prompt).await
    }

    /// Affiliate script written from a product photo. `category_hint` is
    /// passed along as context and may be blank.
    pub async fn script_from_image(
        &self,
        image: &[u8],
        mime_type: &str,
        category_hint: &str,
    ) -> Result<String, GenerationError> {
        check_image(image, mime_type)?;
        let _guard = self.begin(Action::Script)?;
        let key = self.credential()?;
        let prompt = prompts::image_script_prompt(Some(category_hint));
        let text = self
            .backend
            .generate_text_from_image(&key, &prompt, image, mime_type)
            .await?;
        non_empty_text(text)
    }

    /// Rewrite an existing script to read better aloud.
    pub async fn optimize_script(&self, text: &str) -> Result<String, GenerationError> {
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyInput("text"));
        }
        let _guard = self.begin(Action::Optimize)?;
        let key = self.credential()?;
        let prompt = prompts::optimize_script_prompt(text.trim());
        self.complete_text(&key, &prompt).await
    }

    /// TikTok description followed by hashtags for a named product.
    pub async fn tiktok_caption(&self, product: &str) -> Result<String, GenerationError> {
        if product.trim().is_empty() {
            return Err(GenerationError::EmptyInput("product"));
        }
        let _guard = self.begin(Action::Caption)?;
        let key = self.credential()?;
        let prompt = prompts::tiktok_caption_prompt(product.trim());
        self.complete_text(&key, &prompt).await
    }

    async fn complete_text(&self, key: &ApiKey, prompt: &str) -> Result<String, GenerationError> {
        let text = self.backend.generate_text(key, prompt).await?;
        non_empty_text(text)
    }
}

fn check_image(image: &[u8], mime_type: &str) -> Result<(), GenerationError> {
    if image.is_empty() {
        return Err(GenerationError::EmptyInput("image"));
    }
    if !SUPPORTED_IMAGE_TYPES.contains(&mime_type) {
        return Err(GenerationError::UnsupportedMediaType(mime_type.to_string()));
    }
    Ok(())
}

fn non_empty_text(text: Option<String>) -> Result<String, GenerationError> {
    let text = text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(GenerationError::TextGenerationEmpty)?;
    tracing::debug!(chars = text.chars().count(), "copy generated");
    Ok(text)
}
