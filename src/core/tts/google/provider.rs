//! Primary synthesis strategy against Google Cloud TTS.
//!
//! Iterates the configured (model, voice) matrix in strict preference
//! order and returns the first non-empty MP3 payload. Authentication
//! failures abort the whole matrix - a bad grant will not get better on
//! the next voice - while provider-side failures advance to the next
//! pair. Exhaustion is non-fatal to the overall pipeline; the
//! orchestrator falls through to the public fallback provider.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::config::{GoogleTtsConfig, PRIMARY_LANGUAGE_CODE, VoicePair};
use crate::core::auth::CredentialManager;
use crate::core::tts::SpeechRequest;
use crate::core::tts::attempt::{AttemptError, try_in_order};
use crate::core::tts::error::{SynthesisError, SynthesisResult};

/// Primary, authenticated synthesis strategy.
pub struct GoogleTts {
    config: GoogleTtsConfig,
    client: reqwest::Client,
}

impl GoogleTts {
    pub fn new(config: GoogleTtsConfig) -> SynthesisResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| SynthesisError::ProviderTransient {
                status: None,
                message: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self { config, client })
    }

    /// Tries every (model, voice) pair in order; first success wins.
    pub async fn try_synthesize(
        &self,
        request: &SpeechRequest,
        credentials: &CredentialManager,
        cancel: &CancellationToken,
    ) -> SynthesisResult<Bytes> {
        let pairs = self.config.voice_pairs();
        try_in_order("primary", &pairs, |pair| {
            self.attempt_pair(pair, request, credentials, cancel)
        })
        .await
    }

    async fn attempt_pair(
        &self,
        pair: &VoicePair,
        request: &SpeechRequest,
        credentials: &CredentialManager,
        cancel: &CancellationToken,
    ) -> Result<Bytes, AttemptError> {
        // Token problems are systemic: abort the matrix, let the
        // orchestrator fall back.
        let token = credentials
            .get_access_token()
            .await
            .map_err(AttemptError::Fatal)?;

        let body = self.build_body(request, pair);
        let send = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&token.value)
            .json(&body)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(AttemptError::Fatal(SynthesisError::Cancelled));
            }
            outcome = tokio::time::timeout(self.config.attempt_timeout, send) => match outcome {
                Err(_) => {
                    return Err(AttemptError::Transient(SynthesisError::Timeout(
                        self.config.attempt_timeout,
                    )));
                }
                Ok(Err(err)) => {
                    return Err(AttemptError::Transient(SynthesisError::ProviderTransient {
                        status: None,
                        message: format!("transport error: {err}"),
                    }));
                }
                Ok(Ok(response)) => response,
            },
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AttemptError::Transient(SynthesisError::ProviderTransient {
                status: Some(status.as_u16()),
                message: truncate_detail(&detail),
            }));
        }

        let payload: serde_json::Value =
            response
                .json()
                .await
                .map_err(|err| {
                    AttemptError::Transient(SynthesisError::ProviderTransient {
                        status: Some(status.as_u16()),
                        message: format!("malformed response body: {err}"),
                    })
                })?;

        let encoded = payload
            .get("audioContent")
            .and_then(|c| c.as_str())
            .unwrap_or_default();
        if encoded.is_empty() {
            return Err(AttemptError::Transient(SynthesisError::ProviderTransient {
                status: Some(status.as_u16()),
                message: "response missing audioContent".to_string(),
            }));
        }

        let audio = BASE64.decode(encoded).map_err(|err| {
            AttemptError::Transient(SynthesisError::ProviderTransient {
                status: Some(status.as_u16()),
                message: format!("audioContent is not valid base64: {err}"),
            })
        })?;

        Ok(Bytes::from(audio))
    }

    /// Request body per the `text:synthesize` contract. The style
    /// directive rides in `input.prompt` when present; the voice pins the
    /// canonical locale regardless of the request's language hint.
    fn build_body(&self, request: &SpeechRequest, pair: &VoicePair) -> serde_json::Value {
        let input = match request.style_directive.as_deref() {
            Some(prompt) => json!({ "prompt": prompt, "text": request.text }),
            None => json!({ "text": request.text }),
        };

        json!({
            "input": input,
            "voice": {
                "languageCode": PRIMARY_LANGUAGE_CODE,
                "name": pair.voice.as_str(),
                "modelName": pair.model.as_str(),
            },
            "audioConfig": {
                "audioEncoding": "MP3",
                "speakingRate": self.config.speaking_rate,
                "pitch": self.config.pitch,
                "volumeGainDb": self.config.volume_gain_db,
                "sampleRateHertz": self.config.sample_rate_hertz,
            },
        })
    }
}

fn truncate_detail(detail: &str) -> String {
    const MAX: usize = 256;
    if detail.len() <= MAX {
        detail.to_string()
    } else {
        let end = detail
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &detail[..end])
    }
}
