//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::auth::{CredentialManager, JwtBearerExchanger};
use crate::core::pipeline::SynthesisOrchestrator;
use crate::core::tts::{GoogleTts, SynthesisResult, TranslateTts};

/// State handed to every request handler.
///
/// Built once at startup; the credential manager and its token cache are
/// the only mutable pieces and are shared process-wide by design.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SynthesisOrchestrator>,
    pub credentials: Arc<CredentialManager>,
}

impl AppState {
    /// Wires the synthesis pipeline from configuration. Credential
    /// problems degrade to fallback-only operation rather than failing.
    pub fn from_config(config: &ServerConfig) -> SynthesisResult<Self> {
        let exchanger = Arc::new(JwtBearerExchanger::new(config.token_endpoint.clone())?);
        let credentials = Arc::new(CredentialManager::new(
            config.google_credentials.as_deref(),
            exchanger,
        ));

        let primary = GoogleTts::new(config.google_tts_config())?;
        let fallback = TranslateTts::new(config.translate_tts_config())?;

        let orchestrator = Arc::new(SynthesisOrchestrator::new(
            credentials.clone(),
            primary,
            fallback,
        ));

        Ok(Self {
            orchestrator,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_builds_without_credentials() {
        let config = ServerConfig::default();
        let state = AppState::from_config(&config).unwrap();
        assert!(!state.credentials.is_available());
        assert!(!state.orchestrator.primary_available());
    }
}
