use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Institution or speaker class a statement was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechSource {
    Ecb,
    Fed,
    PublicFigure,
}

impl SpeechSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SpeechSource::Ecb => "ecb",
            SpeechSource::Fed => "fed",
            SpeechSource::PublicFigure => "public_figure",
        }
    }
}

impl std::fmt::Display for SpeechSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeechSource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ecb" => Ok(SpeechSource::Ecb),
            "fed" => Ok(SpeechSource::Fed),
            "public_figure" => Ok(SpeechSource::PublicFigure),
            other => Err(CoreError::InvalidSource(other.to_string())),
        }
    }
}

/// A speech as handed over by the scrapers, before it has a database id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSpeech {
    pub source: SpeechSource,
    pub speaker: String,
    pub title: Option<String>,
    pub content: String,
    pub published_at: DateTime<Utc>,
    /// Natural deduplication key.
    pub url: String,
}

impl NewSpeech {
    /// Reject records that cannot be stored or scored meaningfully.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyField`] naming the first blank required field.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("speaker", &self.speaker),
            ("content", &self.content),
            ("url", &self.url),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::EmptyField(name.to_string()));
            }
        }
        Ok(())
    }
}
