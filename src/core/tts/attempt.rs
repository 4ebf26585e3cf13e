//! First-success-wins iteration over ordered attempt descriptors.
//!
//! Both strategies are "try these options in priority order until one
//! produces audio" loops. The options are plain data (model/voice pairs,
//! endpoint variants); [`try_in_order`] is the one consumer, so the
//! cascade logic exists exactly once and is testable without a network.

use std::fmt;
use std::future::Future;

use bytes::Bytes;

use super::error::{SynthesisError, SynthesisResult};

/// Outcome of a single attempt, from the strategy's point of view.
#[derive(Debug)]
pub enum AttemptError {
    /// Move on to the next descriptor.
    Transient(SynthesisError),
    /// Abort the whole strategy immediately (auth failure, cancellation).
    Fatal(SynthesisError),
}

/// Runs `attempt` against each descriptor in order, returning the first
/// non-empty audio payload.
///
/// A [`AttemptError::Fatal`] result short-circuits the remaining
/// descriptors. When every descriptor fails, the result is
/// [`SynthesisError::Exhausted`] wrapping the last observed failure.
pub async fn try_in_order<'a, D, F, Fut>(
    strategy: &str,
    descriptors: &'a [D],
    mut attempt: F,
) -> SynthesisResult<Bytes>
where
    D: fmt::Display,
    F: FnMut(&'a D) -> Fut,
    Fut: Future<Output = Result<Bytes, AttemptError>>,
{
    let mut attempts = 0usize;
    let mut last: Option<SynthesisError> = None;

    for descriptor in descriptors {
        attempts += 1;
        match attempt(descriptor).await {
            Ok(audio) if !audio.is_empty() => {
                tracing::info!(
                    strategy,
                    %descriptor,
                    bytes = audio.len(),
                    "synthesis attempt succeeded"
                );
                return Ok(audio);
            }
            Ok(_) => {
                tracing::warn!(strategy, %descriptor, "provider returned empty audio payload");
                last = Some(SynthesisError::ProviderTransient {
                    status: None,
                    message: "empty audio payload".to_string(),
                });
            }
            Err(AttemptError::Fatal(err)) => {
                tracing::warn!(strategy, %descriptor, error = %err, "fatal failure, aborting strategy");
                return Err(err);
            }
            Err(AttemptError::Transient(err)) => {
                tracing::warn!(strategy, %descriptor, error = %err, "attempt failed, trying next");
                last = Some(err);
            }
        }
    }

    Err(SynthesisError::Exhausted {
        attempts,
        last: Box::new(last.unwrap_or_else(|| SynthesisError::ProviderTransient {
            status: None,
            message: "no attempts configured".to_string(),
        })),
    })
}
