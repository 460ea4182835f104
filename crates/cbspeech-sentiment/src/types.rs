use std::str::FromStr;

use cbspeech_core::AppConfig;
use serde::{Deserialize, Serialize};

/// Sentiment class reported by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Negative,
    Neutral,
}

impl Label {
    /// All labels, in tie-break priority order.
    pub const ALL: [Label; 3] = [Label::Positive, Label::Negative, Label::Neutral];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Positive => "positive",
            Label::Negative => "negative",
            Label::Neutral => "neutral",
        }
    }

    fn slot(self) -> usize {
        match self {
            Label::Positive => 0,
            Label::Negative => 1,
            Label::Neutral => 2,
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Label::Positive),
            "negative" => Ok(Label::Negative),
            "neutral" => Ok(Label::Neutral),
            other => Err(format!("unknown sentiment label: {other}")),
        }
    }
}

/// Per-chunk scores over the fixed label set.
///
/// A label the classifier did not report stays `None`; it is not the same
/// as a score of zero when averaging.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LabelDistribution {
    scores: [Option<f64>; 3],
}

impl LabelDistribution {
    #[must_use]
    pub fn new(positive: f64, negative: f64, neutral: f64) -> Self {
        let mut dist = Self::default();
        dist.insert(Label::Positive, positive);
        dist.insert(Label::Negative, negative);
        dist.insert(Label::Neutral, neutral);
        dist
    }

    /// Build from raw `(label, score)` pairs as returned by a classifier.
    ///
    /// Labels are matched case-insensitively; unknown labels are dropped.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut dist = Self::default();
        for (raw, score) in pairs {
            if let Ok(label) = raw.parse::<Label>() {
                dist.insert(label, score);
            }
        }
        dist
    }

    /// Record a score. Non-finite values are ignored.
    pub fn insert(&mut self, label: Label, score: f64) {
        if score.is_finite() {
            self.scores[label.slot()] = Some(score);
        }
    }

    #[must_use]
    pub fn get(&self, label: Label) -> Option<f64> {
        self.scores[label.slot()]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.iter().all(Option::is_none)
    }
}

/// One unit of text to score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Opaque caller-supplied id used to correlate the verdict with storage.
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Document-level sentiment.
///
/// Per-label scores are arithmetic means of classifier probabilities over
/// the chunks that reported the label. They are not renormalized and need
/// not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentVerdict {
    pub label: Label,
    /// Mean score of the winning label.
    pub score: f64,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    /// Number of chunks the document was split into.
    pub chunk_count: usize,
    /// Number of chunks whose classification contributed to the scores.
    pub classified_chunks: usize,
}

impl SentimentVerdict {
    /// The zero verdict: neutral, all scores 0.0.
    #[must_use]
    pub fn neutral(chunk_count: usize) -> Self {
        Self {
            label: Label::Neutral,
            score: 0.0,
            positive: 0.0,
            negative: 0.0,
            neutral: 0.0,
            chunk_count,
            classified_chunks: 0,
        }
    }

    #[must_use]
    pub fn with_chunk_count(mut self, chunk_count: usize) -> Self {
        self.chunk_count = chunk_count;
        self
    }

    #[must_use]
    pub fn score_for(&self, label: Label) -> f64 {
        match label {
            Label::Positive => self.positive,
            Label::Negative => self.negative,
            Label::Neutral => self.neutral,
        }
    }

    /// `true` when no chunk contributed, i.e. every classification failed.
    #[must_use]
    pub fn is_unscored(&self) -> bool {
        self.classified_chunks == 0
    }
}

pub const DEFAULT_MODEL_TOKEN_LIMIT: usize = 512;
pub const DEFAULT_RESERVED_TOKENS: usize = 2;
pub const DEFAULT_FALLBACK_PREFIX_LENGTH: usize = 2000;

/// Token budget settings for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Classifier's maximum input length, boundary tokens included.
    pub model_token_limit: usize,
    /// Tokens the classifier adds around every input (e.g. `[CLS]`/`[SEP]`).
    pub reserved_tokens: usize,
    /// Character length of the last-resort single chunk.
    pub fallback_prefix_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_token_limit: DEFAULT_MODEL_TOKEN_LIMIT,
            reserved_tokens: DEFAULT_RESERVED_TOKENS,
            fallback_prefix_length: DEFAULT_FALLBACK_PREFIX_LENGTH,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            model_token_limit: config.model_token_limit,
            reserved_tokens: config.reserved_tokens,
            fallback_prefix_length: config.fallback_prefix_length,
        }
    }

    /// Token budget available to each chunk's text. Never less than 1.
    #[must_use]
    pub fn max_tokens(&self) -> usize {
        self.model_token_limit
            .saturating_sub(self.reserved_tokens)
            .max(1)
    }
}
