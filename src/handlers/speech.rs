//! Inbound synthesis endpoint.
//!
//! `POST /v1/speech` accepts the question text and locale and streams back
//! MP3 bytes. The endpoint is public: it serves the questionnaire UI
//! directly and end-user authentication is out of scope by design.

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::Response;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Request body for the synthesis endpoint.
#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    /// Raw question text, possibly HTML-bearing.
    pub text: String,
    /// Caller's locale hint (e.g. "th", "en-US").
    #[serde(default)]
    pub locale: Option<String>,
    /// Optional explicit delivery directive; skips style inference.
    #[serde(default)]
    pub style: Option<String>,
}

/// Synthesizes audio for one question.
pub async fn speak(
    State(state): State<AppState>,
    Json(request): Json<SpeakRequest>,
) -> AppResult<Response> {
    let locale = request.locale.as_deref().unwrap_or("th");

    // Dropping the guard on client disconnect cancels in-flight provider
    // attempts and pending backoff sleeps.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let audio = state
        .orchestrator
        .synthesize(&request.text, locale, request.style.clone(), &cancel)
        .await?;

    Response::builder()
        .header(header::CONTENT_TYPE, "audio/mpeg")
        .header(header::CONTENT_LENGTH, audio.len())
        .body(Body::from(audio))
        .map_err(|err| AppError::Internal(format!("failed to build response: {err}")))
}
