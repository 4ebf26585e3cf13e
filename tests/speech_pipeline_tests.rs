//! End-to-end tests for the synthesis pipeline.
//!
//! These drive the orchestrator against wiremock provider doubles:
//! - primary success and failure cascades
//! - fallback retry/backoff behavior
//! - credential absence and auth failure degradation
//! - validation fast-fail with no network traffic
//!
//! Token exchange is mocked through the `TokenExchanger` trait; no RSA
//! signing happens in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use surveyvoice::core::auth::{AccessToken, CredentialManager, ServiceAccountKey, TokenExchanger};
use surveyvoice::core::pipeline::SynthesisOrchestrator;
use surveyvoice::core::tts::google::{GeminiTtsModel, GeminiVoice, GoogleTts, GoogleTtsConfig};
use surveyvoice::core::tts::translate::{Sleeper, TranslateTts, TranslateTtsConfig};
use surveyvoice::core::tts::{SynthesisError, SynthesisResult};

const SERVICE_ACCOUNT_JSON: &str = r#"{
    "type": "service_account",
    "project_id": "survey-prod",
    "private_key": "not-used-in-tests",
    "client_email": "tts@survey-prod.iam.gserviceaccount.com",
    "token_uri": "https://oauth2.googleapis.com/token"
}"#;

/// Exchanger that mints tokens locally and counts its calls.
struct StaticExchanger {
    calls: AtomicUsize,
    fail: bool,
}

impl StaticExchanger {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenExchanger for StaticExchanger {
    async fn exchange(&self, _key: &ServiceAccountKey) -> SynthesisResult<AccessToken> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SynthesisError::Auth("invalid_grant".to_string()));
        }
        Ok(AccessToken {
            value: "test-bearer-token".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        })
    }
}

/// Sleeper that records requested delays instead of waiting.
#[derive(Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}

/// Small primary matrix: one model, two voices (2 attempts total).
fn primary_config(endpoint: &str) -> GoogleTtsConfig {
    GoogleTtsConfig {
        endpoint: format!("{endpoint}/v1/text:synthesize"),
        models: vec![GeminiTtsModel::Flash],
        voices: vec![GeminiVoice::Achernar, GeminiVoice::Aoede],
        attempt_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn fallback_config(endpoints: Vec<String>) -> TranslateTtsConfig {
    TranslateTtsConfig {
        endpoints,
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn orchestrator(
    exchanger: Arc<dyn TokenExchanger>,
    credentialed: bool,
    primary: GoogleTtsConfig,
    fallback: TranslateTtsConfig,
    sleeper: Arc<dyn Sleeper>,
) -> SynthesisOrchestrator {
    let credentials = if credentialed {
        Arc::new(CredentialManager::new(Some(SERVICE_ACCOUNT_JSON), exchanger))
    } else {
        Arc::new(CredentialManager::disabled(exchanger))
    };
    SynthesisOrchestrator::new(
        credentials,
        GoogleTts::new(primary).unwrap(),
        TranslateTts::with_sleeper(fallback, sleeper).unwrap(),
    )
}

fn primary_audio_response(payload: &[u8]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "audioContent": BASE64.encode(payload),
    }))
}

/// Primary succeeds on the first (model, voice) pair; its bytes come back
/// decoded and the fallback is never touched.
#[tokio::test]
async fn test_primary_success_returns_decoded_audio() {
    let primary_server = MockServer::start().await;
    let fallback_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(primary_audio_response(b"primary-mp3-bytes"))
        .expect(1)
        .mount(&primary_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fallback_server)
        .await;

    let orch = orchestrator(
        StaticExchanger::ok(),
        true,
        primary_config(&primary_server.uri()),
        fallback_config(vec![format!("{}/translate_tts?client=tw-ob", fallback_server.uri())]),
        Arc::new(RecordingSleeper::default()),
    );

    let audio = orch
        .synthesize("How was your visit?", "en", None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(&audio[..], b"primary-mp3-bytes");

    // The request carried the bearer token and the inferred style prompt.
    let requests = primary_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let auth = requests[0].headers.get("authorization").unwrap();
    assert_eq!(auth.to_str().unwrap(), "Bearer test-bearer-token");

    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["input"]["text"], "How was your visit?");
    assert!(body["input"]["prompt"].as_str().is_some());
    assert_eq!(body["voice"]["languageCode"], "th-TH");
    assert_eq!(body["audioConfig"]["audioEncoding"], "MP3");
}

/// The happy scenario from the questionnaire UI: exclamation runs push the
/// happy category, and its cheerful directive rides in `input.prompt`.
#[tokio::test]
async fn test_inferred_style_prompt_reaches_primary() {
    let primary_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(primary_audio_response(b"ok"))
        .mount(&primary_server)
        .await;

    let orch = orchestrator(
        StaticExchanger::ok(),
        true,
        primary_config(&primary_server.uri()),
        fallback_config(vec!["http://127.0.0.1:9/translate_tts".to_string()]),
        Arc::new(RecordingSleeper::default()),
    );

    orch.synthesize("Hello! Great job!!", "en", None, &CancellationToken::new())
        .await
        .unwrap();

    let requests = primary_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["input"]["prompt"].as_str().unwrap();
    assert!(prompt.contains("cheerful"), "prompt was {prompt:?}");
    assert!(prompt.contains("bubbly"), "prompt was {prompt:?}");
}

/// Every primary pair returns 500: the matrix is exhausted (2 attempts),
/// then the fallback's bytes are returned with no error to the caller.
#[tokio::test]
async fn test_primary_exhaustion_falls_back() {
    let primary_server = MockServer::start().await;
    let fallback_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&primary_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fallback-mp3".to_vec()))
        .expect(1)
        .mount(&fallback_server)
        .await;

    let orch = orchestrator(
        StaticExchanger::ok(),
        true,
        primary_config(&primary_server.uri()),
        fallback_config(vec![format!("{}/translate_tts?client=tw-ob", fallback_server.uri())]),
        Arc::new(RecordingSleeper::default()),
    );

    let audio = orch
        .synthesize("Please rate the waiting time.", "en", None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(&audio[..], b"fallback-mp3");
}

/// No credentials configured: the primary endpoint sees zero requests and
/// the call succeeds purely through the fallback.
#[tokio::test]
async fn test_credential_absence_goes_straight_to_fallback() {
    let primary_server = MockServer::start().await;
    let fallback_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&primary_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fallback-only".to_vec()))
        .mount(&fallback_server)
        .await;

    let orch = orchestrator(
        StaticExchanger::ok(),
        false,
        primary_config(&primary_server.uri()),
        fallback_config(vec![format!("{}/translate_tts?client=tw-ob", fallback_server.uri())]),
        Arc::new(RecordingSleeper::default()),
    );

    let audio = orch
        .synthesize("คุณพอใจหรือไม่", "th", None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(&audio[..], b"fallback-only");
}

/// Token exchange failure aborts the primary matrix after one attempt
/// (auth problems are systemic) and still degrades to the fallback.
#[tokio::test]
async fn test_auth_failure_aborts_primary_then_falls_back() {
    let primary_server = MockServer::start().await;
    let fallback_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&primary_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"degraded".to_vec()))
        .mount(&fallback_server)
        .await;

    let exchanger = StaticExchanger::failing();
    let orch = orchestrator(
        exchanger.clone(),
        true,
        primary_config(&primary_server.uri()),
        fallback_config(vec![format!("{}/translate_tts?client=tw-ob", fallback_server.uri())]),
        Arc::new(RecordingSleeper::default()),
    );

    let audio = orch
        .synthesize("Any comments?", "en", None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(&audio[..], b"degraded");
    // One exchange attempt, not one per (model, voice) pair.
    assert_eq!(exchanger.calls(), 1);
}

/// 429 responses retry on the same endpoint with the documented backoff
/// schedule: 1000ms then 2000ms before tries 1 and 2.
#[tokio::test]
async fn test_rate_limit_retries_with_backoff_schedule() {
    let fallback_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&fallback_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"after-backoff".to_vec()))
        .mount(&fallback_server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let orch = orchestrator(
        StaticExchanger::ok(),
        false,
        primary_config("http://127.0.0.1:9"),
        fallback_config(vec![format!("{}/translate_tts?client=tw-ob", fallback_server.uri())]),
        sleeper.clone(),
    );

    let audio = orch
        .synthesize("Rate limited question", "en", None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(&audio[..], b"after-backoff");

    let delays = sleeper.delays.lock().clone();
    assert_eq!(
        delays,
        vec![Duration::from_millis(1000), Duration::from_millis(2000)]
    );
}

/// A non-429 failure abandons the endpoint variant without retries and
/// moves on to the next variant.
#[tokio::test]
async fn test_hard_failure_skips_to_next_endpoint_variant() {
    let broken_server = MockServer::start().await;
    let working_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&broken_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"second-variant".to_vec()))
        .expect(1)
        .mount(&working_server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::default());
    let orch = orchestrator(
        StaticExchanger::ok(),
        false,
        primary_config("http://127.0.0.1:9"),
        fallback_config(vec![
            format!("{}/translate_tts?client=tw-ob", broken_server.uri()),
            format!("{}/translate_tts?client=gtx", working_server.uri()),
        ]),
        sleeper.clone(),
    );

    let audio = orch
        .synthesize("Skip the broken mirror", "en", None, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(&audio[..], b"second-variant");
    assert!(sleeper.delays.lock().is_empty(), "404 must not back off");
}

/// Both strategies exhausted: the caller gets SynthesisFailed carrying the
/// last fallback failure's message and no partial audio.
#[tokio::test]
async fn test_both_strategies_exhausted_surfaces_last_fallback_error() {
    let primary_server = MockServer::start().await;
    let fallback_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&primary_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&fallback_server)
        .await;

    let orch = orchestrator(
        StaticExchanger::ok(),
        true,
        primary_config(&primary_server.uri()),
        fallback_config(vec![
            format!("{}/translate_tts?client=tw-ob", fallback_server.uri()),
            format!("{}/translate_tts?client=gtx", fallback_server.uri()),
        ]),
        Arc::new(RecordingSleeper::default()),
    );

    let err = orch
        .synthesize("Nothing works today", "en", None, &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        SynthesisError::SynthesisFailed(message) => {
            assert!(message.contains("503"), "message was {message:?}");
        }
        other => panic!("expected SynthesisFailed, got {other:?}"),
    }
}

/// Empty and whitespace-only input fail validation before any network
/// call is made.
#[tokio::test]
async fn test_validation_failure_makes_no_network_calls() {
    let primary_server = MockServer::start().await;
    let fallback_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&primary_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&fallback_server)
        .await;

    let orch = orchestrator(
        StaticExchanger::ok(),
        true,
        primary_config(&primary_server.uri()),
        fallback_config(vec![format!("{}/translate_tts?client=tw-ob", fallback_server.uri())]),
        Arc::new(RecordingSleeper::default()),
    );

    for input in ["", "   "] {
        let err = orch
            .synthesize(input, "en", None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Validation(_)));
    }
}

/// Two synthesize calls within the token validity window share one
/// credential exchange.
#[tokio::test]
async fn test_token_cache_reused_across_requests() {
    let primary_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(primary_audio_response(b"audio"))
        .expect(2)
        .mount(&primary_server)
        .await;

    let exchanger = StaticExchanger::ok();
    let orch = orchestrator(
        exchanger.clone(),
        true,
        primary_config(&primary_server.uri()),
        fallback_config(vec!["http://127.0.0.1:9/translate_tts".to_string()]),
        Arc::new(RecordingSleeper::default()),
    );

    let cancel = CancellationToken::new();
    orch.synthesize("First question", "en", None, &cancel)
        .await
        .unwrap();
    orch.synthesize("Second question", "en", None, &cancel)
        .await
        .unwrap();

    assert_eq!(exchanger.calls(), 1, "second request must reuse the cached token");
}

/// An explicit style override bypasses inference and reaches the provider
/// verbatim.
#[tokio::test]
async fn test_style_override_bypasses_inference() {
    let primary_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .respond_with(primary_audio_response(b"audio"))
        .mount(&primary_server)
        .await;

    let orch = orchestrator(
        StaticExchanger::ok(),
        true,
        primary_config(&primary_server.uri()),
        fallback_config(vec!["http://127.0.0.1:9/translate_tts".to_string()]),
        Arc::new(RecordingSleeper::default()),
    );

    orch.synthesize(
        "Hello! Great job!!",
        "en",
        Some("Read this slowly and solemnly".to_string()),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let requests = primary_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["input"]["prompt"], "Read this slowly and solemnly");
}

/// Cancellation aborts pending work instead of exhausting the retry
/// schedule.
#[tokio::test]
async fn test_cancellation_aborts_fallback_retries() {
    let fallback_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&fallback_server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let orch = orchestrator(
        StaticExchanger::ok(),
        false,
        primary_config("http://127.0.0.1:9"),
        fallback_config(vec![format!("{}/translate_tts?client=tw-ob", fallback_server.uri())]),
        Arc::new(RecordingSleeper::default()),
    );

    let err = orch
        .synthesize("Cancelled question", "en", None, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, SynthesisError::Cancelled));
}
