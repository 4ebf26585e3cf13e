//! Credential lifecycle for the primary synthesis provider.
//!
//! A [`CredentialManager`] is constructed once at startup and shared across
//! requests through [`crate::state::AppState`]. Missing or unusable
//! credentials make the manager report unavailable instead of failing -
//! synthesis then routes straight to the fallback provider. That graceful
//! degradation is a deliberate contract: a survey page must keep speaking
//! even when the cloud credentials are misconfigured.

pub mod credentials;
pub mod token;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

pub use credentials::{
    ADC_ENV, CREDENTIALS_ENV, CredentialKind, ServiceAccountKey, classify,
    resolve_credentials_source, well_known_credential_paths,
};
pub use token::{AccessToken, CLOUD_PLATFORM_SCOPE, JwtBearerExchanger, TokenExchanger};

use crate::core::tts::error::{SynthesisError, SynthesisResult};

/// Cached tokens are refreshed once they are within this margin of expiry.
pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Process-lifetime manager for the provider bearer token.
///
/// Concurrent `get_access_token` callers may race into redundant
/// exchanges; both results are valid and the cache is last-writer-wins,
/// so no exclusive lock is held across the exchange await.
pub struct CredentialManager {
    key: Option<ServiceAccountKey>,
    exchanger: Arc<dyn TokenExchanger>,
    cached: RwLock<Option<AccessToken>>,
}

impl CredentialManager {
    /// Builds a manager from a credential source: inline JSON (leading
    /// `{`) or a file path. `None`, unreadable files and non-service-
    /// account descriptors all produce an unavailable manager, never an
    /// error.
    pub fn new(source: Option<&str>, exchanger: Arc<dyn TokenExchanger>) -> Self {
        let key = source.and_then(|source| Self::load_key(source));
        if key.is_none() {
            tracing::info!(
                "primary synthesis credentials unavailable, requests will use the fallback provider"
            );
        }
        Self {
            key,
            exchanger,
            cached: RwLock::new(None),
        }
    }

    /// A manager with no credentials; primary synthesis stays disabled.
    pub fn disabled(exchanger: Arc<dyn TokenExchanger>) -> Self {
        Self {
            key: None,
            exchanger,
            cached: RwLock::new(None),
        }
    }

    fn load_key(source: &str) -> Option<ServiceAccountKey> {
        let raw = if source.trim_start().starts_with('{') {
            source.to_string()
        } else {
            match fs::read_to_string(source) {
                Ok(contents) => contents,
                Err(err) => {
                    tracing::warn!(path = source, error = %err, "cannot read credential file");
                    return None;
                }
            }
        };

        match classify(&raw) {
            CredentialKind::ServiceAccount(key) => {
                tracing::info!(
                    project_id = %key.project_id,
                    client_email = %key.client_email,
                    "loaded service account credentials"
                );
                Some(*key)
            }
            CredentialKind::OAuthClient => {
                tracing::warn!(
                    "credential descriptor is an interactive OAuth client file, \
                     not usable for synthesis"
                );
                None
            }
            CredentialKind::Invalid(reason) => {
                tracing::warn!(%reason, "credential descriptor rejected");
                None
            }
        }
    }

    /// Whether primary synthesis can be attempted at all.
    pub fn is_available(&self) -> bool {
        self.key.is_some()
    }

    /// The project the credentials belong to, when available.
    pub fn project_id(&self) -> Option<&str> {
        self.key.as_ref().map(|key| key.project_id.as_str())
    }

    /// Returns a cached token while it is outside the refresh margin,
    /// otherwise performs an exchange and caches the result.
    pub async fn get_access_token(&self) -> SynthesisResult<AccessToken> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| SynthesisError::Credential("no usable credentials".to_string()))?;

        if let Some(token) = self.cached.read().as_ref() {
            if token.is_fresh(TOKEN_REFRESH_MARGIN) {
                return Ok(token.clone());
            }
        }

        let token = self.exchanger.exchange(key).await?;
        *self.cached.write() = Some(token.clone());
        Ok(token)
    }
}
