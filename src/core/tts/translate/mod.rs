//! Public translate TTS - the unauthenticated fallback strategy.

mod config;
mod provider;

pub use config::{
    DEFAULT_FALLBACK_ENDPOINTS, FALLBACK_LANGUAGE_CODE, FALLBACK_USER_AGENT, TranslateTtsConfig,
};
pub use provider::{Sleeper, TokioSleeper, TranslateTts};
