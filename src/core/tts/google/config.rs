//! Configuration for the primary Google Cloud TTS strategy.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Google Cloud TTS synthesis endpoint.
pub const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Canonical locale pinned for every primary request.
///
/// The chosen voices cover both Thai and Latin scripts under this single
/// code, so the caller's locale hint never changes voice selection. Flagged
/// with product as a possible simplification; preserved as-is for now.
pub const PRIMARY_LANGUAGE_CODE: &str = "th-TH";

/// Gemini TTS models, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GeminiTtsModel {
    /// Low-latency model, tried first.
    #[default]
    Flash,
    /// Higher-control model, tried when flash fails.
    Pro,
}

impl GeminiTtsModel {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            GeminiTtsModel::Flash => "gemini-2.5-flash-preview-tts",
            GeminiTtsModel::Pro => "gemini-2.5-pro-preview-tts",
        }
    }

    /// Models in preference order.
    #[inline]
    pub const fn preference_order() -> &'static [GeminiTtsModel] {
        &[GeminiTtsModel::Flash, GeminiTtsModel::Pro]
    }
}

/// Female prebuilt voices, in preference order. A single consistent voice
/// family keeps questionnaire audio uniform across questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GeminiVoice {
    #[default]
    Achernar,
    Aoede,
    Leda,
    Kore,
}

impl GeminiVoice {
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            GeminiVoice::Achernar => "Achernar",
            GeminiVoice::Aoede => "Aoede",
            GeminiVoice::Leda => "Leda",
            GeminiVoice::Kore => "Kore",
        }
    }

    /// Voices in preference order.
    #[inline]
    pub const fn preference_order() -> &'static [GeminiVoice] {
        &[
            GeminiVoice::Achernar,
            GeminiVoice::Aoede,
            GeminiVoice::Leda,
            GeminiVoice::Kore,
        ]
    }
}

/// One entry of the (model, voice) attempt matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoicePair {
    pub model: GeminiTtsModel,
    pub voice: GeminiVoice,
}

impl fmt::Display for VoicePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.model.as_str(), self.voice.as_str())
    }
}

/// Primary strategy configuration.
#[derive(Debug, Clone)]
pub struct GoogleTtsConfig {
    /// Synthesis endpoint; overridable for tests and regional routing.
    pub endpoint: String,
    /// Models tried in order (outer loop).
    pub models: Vec<GeminiTtsModel>,
    /// Voices tried in order (inner loop).
    pub voices: Vec<GeminiVoice>,
    /// Hard deadline for each (model, voice) attempt.
    pub attempt_timeout: Duration,
    /// Slightly raised pitch for clarity over phone and tablet speakers.
    pub pitch: f32,
    /// Gain in dB applied by the provider.
    pub volume_gain_db: f32,
    pub speaking_rate: f32,
    pub sample_rate_hertz: u32,
}

impl Default for GoogleTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: GOOGLE_TTS_URL.to_string(),
            models: GeminiTtsModel::preference_order().to_vec(),
            voices: GeminiVoice::preference_order().to_vec(),
            attempt_timeout: Duration::from_secs(15),
            pitch: 3.0,
            volume_gain_db: 3.0,
            speaking_rate: 1.0,
            sample_rate_hertz: 24_000,
        }
    }
}

impl GoogleTtsConfig {
    /// The full attempt matrix: models outer, voices inner, both in
    /// declared preference order.
    pub fn voice_pairs(&self) -> Vec<VoicePair> {
        let mut pairs = Vec::with_capacity(self.models.len() * self.voices.len());
        for model in &self.models {
            for voice in &self.voices {
                pairs.push(VoicePair {
                    model: *model,
                    voice: *voice,
                });
            }
        }
        pairs
    }
}
