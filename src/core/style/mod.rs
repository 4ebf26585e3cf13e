//! Emotional style inference for question text.
//!
//! The primary TTS provider accepts a free-form natural-language prompt that
//! biases delivery tone. This module scores question text against a fixed,
//! ordered set of emotion categories and emits the matching directive.
//!
//! Scoring is bilingual: each category carries both English and Thai
//! patterns, since questionnaires on the platform are authored in either
//! script. Repeated terminal punctuation acts as a booster - exclamation
//! runs push `Happy`, question-mark runs push `Surprised`, both
//! proportionally to run length.
//!
//! Inference is pure and deterministic: identical input always yields the
//! identical directive, and score ties resolve by declaration order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Emotion categories in priority (tie-break) order.
///
/// `Neutral` is last and doubles as the default: when nothing matches, its
/// directive is still returned, so callers always get a usable prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprised,
    Curious,
    Friendly,
    Apologetic,
    Encouraging,
    #[default]
    Neutral,
}

impl Emotion {
    /// All categories in declaration order. Scoring iterates this slice, so
    /// the order here is the tie-break order.
    #[inline]
    pub const fn all() -> &'static [Emotion] {
        &[
            Emotion::Happy,
            Emotion::Sad,
            Emotion::Angry,
            Emotion::Surprised,
            Emotion::Curious,
            Emotion::Friendly,
            Emotion::Apologetic,
            Emotion::Encouraging,
            Emotion::Neutral,
        ]
    }

    /// Lowercase name suitable for logging.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprised => "surprised",
            Emotion::Curious => "curious",
            Emotion::Friendly => "friendly",
            Emotion::Apologetic => "apologetic",
            Emotion::Encouraging => "encouraging",
            Emotion::Neutral => "neutral",
        }
    }

    /// The natural-language delivery directive passed verbatim to the
    /// primary provider's prompt field.
    pub const fn directive(&self) -> &'static str {
        match self {
            Emotion::Happy => "Say this in a cheerful, bubbly, upbeat tone with a smile in the voice",
            Emotion::Sad => "Say this gently, in a soft, sympathetic and comforting tone",
            Emotion::Angry => "Say this in a firm, serious, measured tone",
            Emotion::Surprised => "Say this with lively astonishment and rising intonation",
            Emotion::Curious => "Say this in an inquisitive, engaged, wondering tone",
            Emotion::Friendly => "Say this in a warm, welcoming, friendly tone",
            Emotion::Apologetic => "Say this softly, in a sincere, apologetic and humble tone",
            Emotion::Encouraging => "Say this in a supportive, motivating, energetic tone",
            Emotion::Neutral => "Speak in a warm, natural, conversational tone",
        }
    }

    /// Lexical patterns for this category, both scripts.
    const fn patterns(&self) -> &'static [&'static str] {
        match self {
            Emotion::Happy => &[
                r"(?i)\b(great|awesome|wonderful|excellent|fantastic|amazing|happy|glad|love|yay)\b",
                r"ดีใจ",
                r"มีความสุข",
                r"เยี่ยม",
                r"สนุก",
                r"สุดยอด",
            ],
            Emotion::Sad => &[
                r"(?i)\b(sad|unhappy|unfortunate|regret|miss(ed|ing)?|heartbroken)\b",
                r"(?i)sorry to hear",
                r"เสียใจ",
                r"เศร้า",
                r"ผิดหวัง",
            ],
            Emotion::Angry => &[
                r"(?i)\b(angry|furious|terrible|awful|unacceptable|worst|horrible)\b",
                r"โกรธ",
                r"แย่มาก",
                r"ห่วย",
            ],
            Emotion::Surprised => &[
                r"(?i)\b(wow|whoa|unbelievable|incredible|surprised|shocking)\b",
                r"(?i)no way",
                r"ว้าว",
                r"ตกใจ",
                r"ไม่อยากเชื่อ",
            ],
            Emotion::Curious => &[
                r"(?i)\b(why|how|what|which|wonder|curious)\b",
                r"ทำไม",
                r"อย่างไร",
                r"ยังไง",
                r"อะไร",
                r"หรือไม่",
            ],
            Emotion::Friendly => &[
                r"(?i)\b(hello|hi|hey|welcome|thanks|thank you|nice to)\b",
                r"สวัสดี",
                r"ยินดีต้อนรับ",
                r"ขอบคุณ",
            ],
            Emotion::Apologetic => &[
                r"(?i)\b(sorry|apologi[sz]e|apologies|excuse|forgive|pardon)\b",
                r"ขอโทษ",
                r"ขออภัย",
            ],
            Emotion::Encouraging => &[
                r"(?i)\b(well done|keep going|keep it up|you can do it|proud of you|good luck)\b",
                r"สู้ๆ",
                r"เก่งมาก",
                r"ทำได้",
            ],
            Emotion::Neutral => &[],
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled pattern table, one entry per category in declaration order.
static PATTERN_TABLE: Lazy<Vec<(Emotion, Vec<Regex>)>> = Lazy::new(|| {
    Emotion::all()
        .iter()
        .map(|emotion| {
            let compiled = emotion
                .patterns()
                .iter()
                .map(|p| Regex::new(p).expect("valid emotion pattern"))
                .collect();
            (*emotion, compiled)
        })
        .collect()
});

static EXCLAMATION_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!{2,}").expect("valid regex"));
static QUESTION_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?{2,}").expect("valid regex"));

/// Scores the text and returns the winning category with its score.
///
/// A zero winning score means no emotional signal was found; the winner is
/// then `Neutral` by construction since every other score is also zero and
/// declaration order keeps the first maximum only when it is strictly
/// higher.
pub fn infer_emotion(text: &str) -> (Emotion, u32) {
    let mut best = (Emotion::Neutral, 0u32);
    let mut first = true;

    for (emotion, patterns) in PATTERN_TABLE.iter() {
        let mut score: u32 = patterns
            .iter()
            .map(|re| re.find_iter(text).count() as u32)
            .sum();

        score += punctuation_boost(*emotion, text);

        // Strictly-greater comparison preserves declaration-order tie-break.
        if first || score > best.1 {
            best = (*emotion, score);
            first = false;
        }
    }

    if best.1 == 0 { (Emotion::Neutral, 0) } else { best }
}

/// Returns the delivery directive for the text. Always defined: with no
/// emotional signal the neutral directive is used.
pub fn infer_style(text: &str) -> &'static str {
    let (emotion, score) = infer_emotion(text);
    tracing::debug!(emotion = emotion.as_str(), score, "inferred delivery style");
    emotion.directive()
}

/// Repeated-punctuation boost: each `!` run of length >= 2 adds its length
/// to `Happy`; each `?` run of length >= 2 adds its length to `Surprised`.
fn punctuation_boost(emotion: Emotion, text: &str) -> u32 {
    let re = match emotion {
        Emotion::Happy => &EXCLAMATION_RUN_RE,
        Emotion::Surprised => &QUESTION_RUN_RE,
        _ => return 0,
    };
    re.find_iter(text).map(|m| m.len() as u32).sum()
}
