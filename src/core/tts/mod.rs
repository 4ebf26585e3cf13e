//! Synthesis strategies and their shared types.

pub mod attempt;
pub mod error;
pub mod google;
pub mod translate;

pub use attempt::{AttemptError, try_in_order};
pub use error::{SynthesisError, SynthesisResult};
pub use google::{GoogleTts, GoogleTtsConfig};
pub use translate::{TranslateTts, TranslateTtsConfig};

/// A single synthesis request after normalization.
///
/// Created per call and discarded once audio (or a terminal error) is
/// produced. The locale hint is carried for observability only; both
/// strategies pin a canonical language.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    /// Normalized, non-empty question text, at most 5000 characters.
    pub text: String,
    /// The caller's locale hint, logged but not used for routing.
    pub language_hint: String,
    /// Natural-language delivery directive for the primary provider.
    pub style_directive: Option<String>,
}
