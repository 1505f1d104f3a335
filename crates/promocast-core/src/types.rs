/// Media types accepted as the source frame of an image-to-video job.
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif"];

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoRequest {
    pub image: Vec<u8>,
    pub mime_type: String,
    pub prompt: String,
}

/// Provider-side failure reported on a finished operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationFailure {
    pub code: i64,
    pub message: String,
}

/// Snapshot of a remote long-running video job. Only ever replaced
/// wholesale by a freshly polled snapshot, never patched in place.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOperation {
    pub name: String,
    pub done: bool,
    pub asset_uri: Option<String>,
    pub failure: Option<OperationFailure>,
}

impl GenerationOperation {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            asset_uri: None,
            failure: None,
        }
    }

    pub fn finished(name: impl Into<String>, asset_uri: Option<String>) -> Self {
        Self {
            name: name.into(),
            done: true,
            asset_uri,
            failure: None,
        }
    }
}

/// Raw outcome of an asset download. Status classification is left to the caller.
#[derive(Debug, Clone)]
pub struct AssetResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl AssetResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
