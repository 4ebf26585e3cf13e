pub mod config;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use core::auth::CredentialManager;
pub use core::pipeline::SynthesisOrchestrator;
pub use core::tts::{SpeechRequest, SynthesisError, SynthesisResult};
pub use errors::{AppError, AppResult};
pub use state::AppState;
