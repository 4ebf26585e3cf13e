//! Text normalization for synthesis input.
//!
//! Question text arrives from a rich-text editor, so it routinely carries
//! HTML tags, encoded entities and ragged whitespace. Everything sent to a
//! TTS provider goes through [`normalize`] first.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum number of characters kept after cleaning.
pub const MAX_TEXT_CHARS: usize = 5000;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// HTML entities the questionnaire editor is known to emit.
///
/// `&amp;` is decoded last so that double-encoded sequences are only
/// unwrapped one level per pass.
const ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

/// Cleans user-authored question text into plain speakable text.
///
/// Steps, in order: strip markup tags, decode a fixed set of HTML entities,
/// collapse whitespace runs to single spaces, trim, and truncate to
/// [`MAX_TEXT_CHARS`] characters. Never fails; an empty result is the
/// caller's signal to reject the request.
///
/// # Example
///
/// ```rust
/// use surveyvoice::core::text::normalize;
///
/// assert_eq!(normalize("<p>How was&nbsp;your   visit?</p>"), "How was your visit?");
/// ```
pub fn normalize(raw: &str) -> String {
    let stripped = TAG_RE.replace_all(raw, " ");

    let mut decoded = stripped.into_owned();
    for (entity, replacement) in ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }

    let collapsed = WHITESPACE_RE.replace_all(&decoded, " ");
    let trimmed = collapsed.trim();

    if trimmed.chars().count() <= MAX_TEXT_CHARS {
        trimmed.to_string()
    } else {
        // The cut may land right after a space; strip it so cleaning an
        // already-clean string changes nothing.
        let mut capped: String = trimmed.chars().take(MAX_TEXT_CHARS).collect();
        capped.truncate(capped.trim_end().len());
        capped
    }
}
