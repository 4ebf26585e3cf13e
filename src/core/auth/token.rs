//! Short-lived access token exchange.
//!
//! Service-account keys are long-lived signing material; the provider API
//! wants a bearer token. The exchange is the standard JWT-bearer OAuth2
//! grant: sign an RS256 assertion with the key, POST it to the key's
//! `token_uri`, receive `{access_token, expires_in}`.
//!
//! The exchange sits behind the [`TokenExchanger`] trait so the cache
//! logic in [`super::CredentialManager`] can be tested with a counting
//! mock instead of a live endpoint.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::credentials::ServiceAccountKey;
use crate::core::tts::error::{SynthesisError, SynthesisResult};

/// OAuth2 scope requested for synthesis calls.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Assertion lifetime requested from the token endpoint.
const ASSERTION_LIFETIME: Duration = Duration::from_secs(3600);

/// How long the token endpoint may take before the exchange is abandoned.
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(15);

/// A bearer token with its absolute expiry.
///
/// Owned by the credential manager's cache; never persisted.
#[derive(Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: Instant,
}

impl AccessToken {
    /// Whether the token is still usable given a safety margin: reuse is
    /// disallowed once `now >= expires_at - margin`.
    pub fn is_fresh(&self, margin: Duration) -> bool {
        match self.expires_at.checked_duration_since(Instant::now()) {
            Some(remaining) => remaining > margin,
            None => false,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Exchanges a service-account key for a short-lived access token.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self, key: &ServiceAccountKey) -> SynthesisResult<AccessToken>;
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Production exchanger speaking the JWT-bearer grant over HTTPS.
pub struct JwtBearerExchanger {
    client: reqwest::Client,
    /// Overrides the key's `token_uri` when set (used by tests and
    /// self-hosted proxies).
    token_endpoint: Option<String>,
}

impl JwtBearerExchanger {
    pub fn new(token_endpoint: Option<String>) -> SynthesisResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(EXCHANGE_TIMEOUT)
            .build()
            .map_err(|err| SynthesisError::Auth(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            token_endpoint,
        })
    }

    fn build_assertion(&self, key: &ServiceAccountKey) -> SynthesisResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| SynthesisError::Auth(format!("system clock error: {err}")))?
            .as_secs();

        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME.as_secs(),
        };

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|err| SynthesisError::Auth(format!("invalid private key: {err}")))?;

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|err| SynthesisError::Auth(format!("failed to sign assertion: {err}")))
    }
}

#[async_trait]
impl TokenExchanger for JwtBearerExchanger {
    async fn exchange(&self, key: &ServiceAccountKey) -> SynthesisResult<AccessToken> {
        let assertion = self.build_assertion(key)?;
        let endpoint = self
            .token_endpoint
            .as_deref()
            .unwrap_or(key.token_uri.as_str());

        let issued_at = Instant::now();
        let response = self
            .client
            .post(endpoint)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|err| SynthesisError::Auth(format!("token endpoint unreachable: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| SynthesisError::Auth(format!("malformed token response: {err}")))?;

        tracing::debug!(
            expires_in = token.expires_in,
            "exchanged service account credentials for access token"
        );

        Ok(AccessToken {
            value: token.access_token,
            expires_at: issued_at + Duration::from_secs(token.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_freshness_margin() {
        let margin = Duration::from_secs(300);

        let fresh = AccessToken {
            value: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(fresh.is_fresh(margin));

        let inside_margin = AccessToken {
            value: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(120),
        };
        assert!(!inside_margin.is_fresh(margin));

        let expired = AccessToken {
            value: "t".to_string(),
            expires_at: Instant::now() - Duration::from_secs(1),
        };
        assert!(!expired.is_fresh(margin));
    }

    #[test]
    fn test_debug_hides_token_value() {
        let token = AccessToken {
            value: "secret-bearer".to_string(),
            expires_at: Instant::now(),
        };
        assert!(!format!("{token:?}").contains("secret-bearer"));
    }
}
