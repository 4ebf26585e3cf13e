//! Configuration for the public fallback TTS strategy.

use std::time::Duration;

/// Endpoint variants tried in order. They differ only in host and client
/// query parameter; the engine behind them is the same.
pub const DEFAULT_FALLBACK_ENDPOINTS: [&str; 2] = [
    "https://translate.google.com/translate_tts?client=tw-ob",
    "https://translate.googleapis.com/translate_tts?client=gtx",
];

/// Canonical language code sent regardless of the caller's locale hint,
/// mirroring the primary strategy's pinned voice locale.
pub const FALLBACK_LANGUAGE_CODE: &str = "th";

/// The public endpoint rejects non-browser clients, so requests carry a
/// browser-like identification header.
pub const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fallback strategy configuration.
#[derive(Debug, Clone)]
pub struct TranslateTtsConfig {
    /// Endpoint variants, each a full URL whose query is preserved.
    pub endpoints: Vec<String>,
    /// Tries per endpoint, including the first.
    pub max_tries: u32,
    /// Base backoff before the second try.
    pub base_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
    /// Hard deadline per HTTP attempt.
    pub request_timeout: Duration,
}

impl Default for TranslateTtsConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_FALLBACK_ENDPOINTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_tries: 3,
            base_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(5000),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl TranslateTtsConfig {
    /// Delay before try `k` (0-indexed): none for the first try, then
    /// `min(base * 2^(k-1), cap)`.
    pub fn backoff_delay(&self, try_index: u32) -> Duration {
        if try_index == 0 {
            return Duration::ZERO;
        }
        let factor = 1u64 << (try_index - 1).min(32);
        let delay = self
            .base_backoff
            .as_millis()
            .saturating_mul(factor as u128)
            .min(self.max_backoff.as_millis());
        Duration::from_millis(delay as u64)
    }
}
