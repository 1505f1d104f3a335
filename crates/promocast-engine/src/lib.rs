pub mod backend_trait;
pub mod gemini_backend;
pub mod null_backend;
pub mod poller;
pub mod registry;

pub use backend_trait::GenerationBackend;
pub use gemini_backend::GeminiBackend;
pub use null_backend::NullBackend;
pub use poller::{CancelHandle, CancelSignal, OperationPoller, PollPolicy};
pub use registry::BackendRegistry;
