pub mod config;
pub mod credential;
pub mod error;
pub mod prompts;
pub mod types;

pub use config::AppConfig;
pub use credential::{ApiKey, CredentialProvider, Credentials, EnvProvider, FileStore, SessionCache};
pub use error::{ConfigError, CredentialError, GenerationError, WavError};
pub use prompts::{PriceTag, SpeakingStyle, VoiceProfile};
pub use types::{AssetResponse, GenerationOperation, OperationFailure, SpeechRequest, VideoRequest};
