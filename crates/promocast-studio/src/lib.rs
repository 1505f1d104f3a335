pub mod studio;

pub use studio::{Action, Studio, DEFAULT_VIDEO_PROMPT};
