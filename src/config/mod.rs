//! Configuration for the SurveyVoice server.
//!
//! Everything is environment-driven (a `.env` file is loaded by `main`
//! before this runs). Credential resolution is deliberately forgiving:
//! missing or invalid Google credentials disable the primary strategy but
//! never fail startup, because the questionnaire must keep speaking
//! through the fallback provider.

use std::env;
use std::time::Duration;

use crate::core::auth::resolve_credentials_source;
use crate::core::tts::{GoogleTtsConfig, TranslateTtsConfig};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    /// Google credential source - inline JSON, a file path, or `None` to
    /// resolve from the environment and well-known locations.
    pub google_credentials: Option<String>,

    /// Override for the primary synthesis endpoint (tests, regional
    /// routing). `None` uses the public endpoint.
    pub primary_endpoint: Option<String>,
    /// Override for the OAuth token endpoint. `None` uses the key file's
    /// `token_uri`.
    pub token_endpoint: Option<String>,
    /// Override for the fallback endpoint list (comma-separated URLs).
    pub fallback_endpoints: Option<Vec<String>>,

    /// Per-attempt deadline for primary requests.
    pub primary_timeout: Duration,
    /// Per-attempt deadline for fallback requests.
    pub fallback_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3100,
            google_credentials: None,
            primary_endpoint: None,
            token_endpoint: None,
            fallback_endpoints: None,
            primary_timeout: Duration::from_secs(15),
            fallback_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset. Never fails on missing credentials.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_string("SURVEYVOICE_HOST").unwrap_or(defaults.host),
            port: env_parse("SURVEYVOICE_PORT").unwrap_or(defaults.port),
            google_credentials: resolve_credentials_source(None),
            primary_endpoint: env_string("SURVEYVOICE_PRIMARY_ENDPOINT"),
            token_endpoint: env_string("SURVEYVOICE_TOKEN_ENDPOINT"),
            fallback_endpoints: env_string("SURVEYVOICE_FALLBACK_ENDPOINTS")
                .map(|raw| parse_endpoint_list(&raw)),
            primary_timeout: env_parse("SURVEYVOICE_PRIMARY_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.primary_timeout),
            fallback_timeout: env_parse("SURVEYVOICE_FALLBACK_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.fallback_timeout),
        }
    }

    /// Bind address string.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Primary strategy configuration derived from this server config.
    pub fn google_tts_config(&self) -> GoogleTtsConfig {
        let mut config = GoogleTtsConfig {
            attempt_timeout: self.primary_timeout,
            ..Default::default()
        };
        if let Some(endpoint) = &self.primary_endpoint {
            config.endpoint = endpoint.clone();
        }
        config
    }

    /// Fallback strategy configuration derived from this server config.
    pub fn translate_tts_config(&self) -> TranslateTtsConfig {
        let mut config = TranslateTtsConfig {
            request_timeout: self.fallback_timeout,
            ..Default::default()
        };
        if let Some(endpoints) = &self.fallback_endpoints {
            if !endpoints.is_empty() {
                config.endpoints = endpoints.clone();
            }
        }
        config
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse().ok())
}

fn parse_endpoint_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
