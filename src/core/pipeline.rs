//! Synthesis orchestration: normalize, infer style, primary, fallback.
//!
//! One orchestrator is built at startup and shared across requests. Each
//! `synthesize` call is independent; the only shared mutable state in the
//! whole pipeline is the credential manager's token cache.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::core::auth::CredentialManager;
use crate::core::style;
use crate::core::text;
use crate::core::tts::error::{SynthesisError, SynthesisResult};
use crate::core::tts::{GoogleTts, SpeechRequest, TranslateTts};

/// Composes the synthesis strategies behind a single entry point.
pub struct SynthesisOrchestrator {
    credentials: Arc<CredentialManager>,
    primary: GoogleTts,
    fallback: TranslateTts,
}

impl SynthesisOrchestrator {
    pub fn new(
        credentials: Arc<CredentialManager>,
        primary: GoogleTts,
        fallback: TranslateTts,
    ) -> Self {
        Self {
            credentials,
            primary,
            fallback,
        }
    }

    /// Whether the primary strategy has usable credentials.
    pub fn primary_available(&self) -> bool {
        self.credentials.is_available()
    }

    /// Produces MP3 bytes for the given raw question text.
    ///
    /// Fails fast with [`SynthesisError::Validation`] on empty input,
    /// before any network call. Primary failures are logged and absorbed;
    /// only the last fallback failure surfaces to the caller, wrapped in
    /// [`SynthesisError::SynthesisFailed`]. The cancellation token aborts
    /// in-flight attempts and pending backoff sleeps.
    pub async fn synthesize(
        &self,
        raw_text: &str,
        locale: &str,
        style_override: Option<String>,
        cancel: &CancellationToken,
    ) -> SynthesisResult<Bytes> {
        if raw_text.trim().is_empty() {
            return Err(SynthesisError::Validation(
                "text must not be empty".to_string(),
            ));
        }

        let normalized = text::normalize(raw_text);
        if normalized.is_empty() {
            return Err(SynthesisError::Validation(
                "text is empty after removing markup".to_string(),
            ));
        }

        let style_directive = style_override
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| style::infer_style(&normalized).to_string());

        let request = SpeechRequest {
            text: normalized,
            language_hint: locale.to_string(),
            style_directive: Some(style_directive),
        };
        tracing::debug!(
            locale = %request.language_hint,
            chars = request.text.chars().count(),
            "synthesizing question audio"
        );

        if self.credentials.is_available() {
            match self
                .primary
                .try_synthesize(&request, &self.credentials, cancel)
                .await
            {
                Ok(audio) => return Ok(audio),
                Err(SynthesisError::Cancelled) => return Err(SynthesisError::Cancelled),
                Err(err) => {
                    // Expected degraded-mode condition: log, fall through.
                    tracing::warn!(error = %err, "primary synthesis failed, using fallback");
                }
            }
        } else {
            tracing::debug!("primary synthesis unavailable, using fallback");
        }

        match self.fallback.try_synthesize(&request, cancel).await {
            Ok(audio) => Ok(audio),
            Err(SynthesisError::Cancelled) => Err(SynthesisError::Cancelled),
            Err(err) => Err(SynthesisError::SynthesisFailed(err.root_message())),
        }
    }
}
