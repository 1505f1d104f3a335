use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("environment variable not found: {0}")]
    EnvVarNotFound(String),
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read credential store {path}: {source}")]
    StoreRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write credential store {path}: {source}")]
    StoreWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum WavError {
    #[error("audio payload is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("PCM payload of {0} bytes does not fit a RIFF container")]
    PayloadTooLarge(usize),

    #[error("malformed WAV header: {0}")]
    MalformedHeader(String),
}

/// Every way a generation call can fail. None of these are retried
/// internally; the caller decides whether to try again.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API key not found, set one with `promocast key set`")]
    MissingCredential,

    #[error("{0} cannot be empty")]
    EmptyInput(&'static str),

    #[error("audio generation failed, no audio data received")]
    AudioGenerationEmpty,

    #[error("text generation failed, the model returned an empty response")]
    TextGenerationEmpty,

    #[error("video generation finished but no download link was found")]
    GenerationIncomplete,

    #[error("video generation failed upstream (code {code}): {message}")]
    GenerationFailed { code: i64, message: String },

    #[error("video generation did not finish within {0:?}")]
    GenerationTimeout(Duration),

    #[error("generation cancelled")]
    Cancelled,

    #[error("API key is invalid or lacks permission to download the generated asset")]
    CredentialRejected,

    #[error("failed to download asset: {0}")]
    AssetDownloadFailed(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("a {0} request is already in progress")]
    Busy(&'static str),

    #[error("invalid audio payload: {0}")]
    InvalidAudio(#[from] WavError),

    #[error("credential lookup failed: {0}")]
    Credential(#[from] CredentialError),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend not found: {0}")]
    BackendNotFound(String),

    #[error("backend initialization failed: {0}")]
    InitializationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_names_field() {
        let err = GenerationError::EmptyInput("text");
        assert_eq!(err.to_string(), "text cannot be empty");
    }

    #[test]
    fn test_credential_rejected_is_actionable() {
        let msg = GenerationError::CredentialRejected.to_string();
        assert!(msg.contains("API key"));
    }

    #[test]
    fn test_wav_error_converts_into_generation_error() {
        let err: GenerationError = WavError::InvalidBase64("bad".to_string()).into();
        match err {
            GenerationError::InvalidAudio(WavError::InvalidBase64(msg)) => assert_eq!(msg, "bad"),
            other => panic!("expected InvalidAudio, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_message_includes_duration() {
        let err = GenerationError::GenerationTimeout(Duration::from_secs(30));
        assert!(err.to_string().contains("30s"));
    }
}
