//! Fallback synthesis strategy against the public translate TTS endpoint.
//!
//! Unauthenticated and best-effort: each endpoint variant gets up to
//! `max_tries` attempts with capped exponential backoff. Rate limiting
//! (429) and timeouts retry on the same endpoint; any other non-success
//! status abandons the variant and moves to the next one. The first 2xx
//! response with a non-empty body wins.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::USER_AGENT;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::config::{FALLBACK_LANGUAGE_CODE, FALLBACK_USER_AGENT, TranslateTtsConfig};
use crate::core::tts::SpeechRequest;
use crate::core::tts::attempt::{AttemptError, try_in_order};
use crate::core::tts::error::{SynthesisError, SynthesisResult};

/// Async sleep seam so backoff tests can observe the schedule instead of
/// waiting it out.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Public, unauthenticated fallback strategy.
pub struct TranslateTts {
    config: TranslateTtsConfig,
    client: reqwest::Client,
    sleeper: std::sync::Arc<dyn Sleeper>,
}

impl TranslateTts {
    pub fn new(config: TranslateTtsConfig) -> SynthesisResult<Self> {
        Self::with_sleeper(config, std::sync::Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        config: TranslateTtsConfig,
        sleeper: std::sync::Arc<dyn Sleeper>,
    ) -> SynthesisResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| SynthesisError::ProviderTransient {
                status: None,
                message: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self {
            config,
            client,
            sleeper,
        })
    }

    /// Tries every endpoint variant in order, retrying each with backoff.
    pub async fn try_synthesize(
        &self,
        request: &SpeechRequest,
        cancel: &CancellationToken,
    ) -> SynthesisResult<Bytes> {
        try_in_order("fallback", &self.config.endpoints, |endpoint| {
            self.attempt_endpoint(endpoint, request, cancel)
        })
        .await
    }

    /// Runs the bounded retry loop for one endpoint variant.
    async fn attempt_endpoint(
        &self,
        endpoint: &str,
        request: &SpeechRequest,
        cancel: &CancellationToken,
    ) -> Result<Bytes, AttemptError> {
        let url = self
            .build_url(endpoint, &request.text)
            .map_err(AttemptError::Transient)?;

        let mut last = SynthesisError::ProviderTransient {
            status: None,
            message: "no attempt made".to_string(),
        };

        for try_index in 0..self.config.max_tries {
            let delay = self.config.backoff_delay(try_index);
            if !delay.is_zero() {
                tracing::debug!(endpoint, try_index, ?delay, "backing off before retry");
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(AttemptError::Fatal(SynthesisError::Cancelled));
                    }
                    _ = self.sleeper.sleep(delay) => {}
                }
            }

            match self.request_once(url.clone(), cancel).await {
                Ok(audio) => return Ok(audio),
                Err(AttemptError::Transient(err)) if err.is_retryable() => {
                    tracing::debug!(endpoint, try_index, error = %err, "retryable failure");
                    last = err;
                }
                Err(other) => return Err(other),
            }
        }

        Err(AttemptError::Transient(last))
    }

    /// One HTTP GET with the per-attempt timeout and cancellation race.
    async fn request_once(
        &self,
        url: Url,
        cancel: &CancellationToken,
    ) -> Result<Bytes, AttemptError> {
        let send = self
            .client
            .get(url)
            .header(USER_AGENT, FALLBACK_USER_AGENT)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(AttemptError::Fatal(SynthesisError::Cancelled));
            }
            outcome = tokio::time::timeout(self.config.request_timeout, send) => match outcome {
                Err(_) => {
                    return Err(AttemptError::Transient(SynthesisError::Timeout(
                        self.config.request_timeout,
                    )));
                }
                Ok(Err(err)) => {
                    // Transport failures abandon the endpoint variant.
                    return Err(AttemptError::Transient(SynthesisError::ProviderTransient {
                        status: None,
                        message: format!("transport error: {err}"),
                    }));
                }
                Ok(Ok(response)) => response,
            },
        };

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_secs = response
                .headers()
                .get(http::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(AttemptError::Transient(SynthesisError::RateLimited {
                retry_after_secs,
            }));
        }
        if !status.is_success() {
            return Err(AttemptError::Transient(SynthesisError::ProviderTransient {
                status: Some(status.as_u16()),
                message: format!("endpoint returned {status}"),
            }));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|err| {
                AttemptError::Transient(SynthesisError::ProviderTransient {
                    status: Some(status.as_u16()),
                    message: format!("failed to read body: {err}"),
                })
            })?;

        if audio.is_empty() {
            return Err(AttemptError::Transient(SynthesisError::ProviderTransient {
                status: Some(status.as_u16()),
                message: "empty audio payload".to_string(),
            }));
        }
        Ok(audio)
    }

    /// Appends the request parameters to the variant URL, preserving any
    /// client parameters the variant already carries.
    fn build_url(&self, endpoint: &str, text: &str) -> Result<Url, SynthesisError> {
        let mut url = Url::parse(endpoint).map_err(|err| SynthesisError::ProviderTransient {
            status: None,
            message: format!("invalid fallback endpoint {endpoint:?}: {err}"),
        })?;
        url.query_pairs_mut()
            .append_pair("ie", "UTF-8")
            .append_pair("tl", FALLBACK_LANGUAGE_CODE)
            .append_pair("q", text);
        Ok(url)
    }
}
