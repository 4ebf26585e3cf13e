//! Error taxonomy for the synthesis pipeline.
//!
//! Every failure mode is a tagged variant carrying structured fields; no
//! component discriminates on message text. Only [`SynthesisError::Validation`]
//! and [`SynthesisError::SynthesisFailed`] cross the service boundary - the
//! rest are recovered inside the owning strategy or orchestrator.

use thiserror::Error;

/// Errors that can occur while producing audio for a request.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Input was empty or unusable after normalization. Surfaced to the
    /// caller immediately, before any network activity.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Credential descriptor missing, unreadable or of the wrong kind.
    /// Disables the primary strategy only; never fatal to a request.
    #[error("Credential error: {0}")]
    Credential(String),

    /// Token exchange failed. Fatal to the current primary attempt
    /// sequence (authentication failure is systemic, not per-voice), but
    /// the orchestrator still falls through to the fallback.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Non-success or malformed response from a provider. Retried or
    /// skipped within the owning strategy's loop.
    #[error("Provider error (status {status:?}): {message}")]
    ProviderTransient {
        status: Option<u16>,
        message: String,
    },

    /// HTTP 429 from the fallback provider. Retried with backoff.
    #[error("Rate limited (retry-after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// A per-attempt deadline elapsed. Retried like a transient failure.
    #[error("Attempt timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The caller cancelled the request; aborts in-flight retries.
    #[error("Request cancelled")]
    Cancelled,

    /// A strategy tried every configured option without success.
    #[error("All {attempts} synthesis attempts failed: {last}")]
    Exhausted {
        attempts: usize,
        #[source]
        last: Box<SynthesisError>,
    },

    /// Terminal failure: both strategies exhausted. Carries the last
    /// fallback failure's message for the caller.
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),
}

impl SynthesisError {
    /// Whether the fallback strategy may retry this failure on the same
    /// endpoint (rate limiting and timeouts only).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SynthesisError::RateLimited { .. } | SynthesisError::Timeout(_)
        )
    }

    /// The innermost failure message, unwrapping exhaustion wrappers.
    pub fn root_message(&self) -> String {
        match self {
            SynthesisError::Exhausted { last, .. } => last.root_message(),
            other => other.to_string(),
        }
    }
}

/// Result type for synthesis operations.
pub type SynthesisResult<T> = Result<T, SynthesisError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_retryable_classification() {
        assert!(
            SynthesisError::RateLimited {
                retry_after_secs: Some(2)
            }
            .is_retryable()
        );
        assert!(SynthesisError::Timeout(Duration::from_secs(10)).is_retryable());
        assert!(
            !SynthesisError::ProviderTransient {
                status: Some(500),
                message: "server error".into()
            }
            .is_retryable()
        );
        assert!(!SynthesisError::Auth("bad grant".into()).is_retryable());
    }

    #[test]
    fn test_root_message_unwraps_exhaustion() {
        let err = SynthesisError::Exhausted {
            attempts: 6,
            last: Box::new(SynthesisError::ProviderTransient {
                status: Some(503),
                message: "unavailable".into(),
            }),
        };
        assert!(err.root_message().contains("unavailable"));
        assert!(!err.root_message().contains("attempts"));
    }
}
