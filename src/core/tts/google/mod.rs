//! Google Cloud TTS - the primary, authenticated synthesis strategy.

mod config;
mod provider;

pub use config::{
    GOOGLE_TTS_URL, GeminiTtsModel, GeminiVoice, GoogleTtsConfig, PRIMARY_LANGUAGE_CODE, VoicePair,
};
pub use provider::GoogleTts;
