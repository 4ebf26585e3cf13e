//! Core synthesis pipeline: text normalization, style inference,
//! credential management and the primary/fallback strategy cascade.

pub mod auth;
pub mod pipeline;
pub mod style;
pub mod text;
pub mod tts;

pub use auth::CredentialManager;
pub use pipeline::SynthesisOrchestrator;
pub use tts::{SpeechRequest, SynthesisError, SynthesisResult};
