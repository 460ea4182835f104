//! Speech import from scraper JSON exports.
//!
//! Invalid records are logged and counted; the rest of the file is imported.

use std::path::Path;

use anyhow::Context;
use cbspeech_core::{NewSpeech, SpeechSource};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One record as written by the scrapers. `source` stays a string until
/// validated so unknown sources can be reported per record.
#[derive(Debug, Deserialize)]
pub(crate) struct ImportRecord {
    pub source: String,
    pub speaker: String,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

impl ImportRecord {
    /// Validate into a storable speech.
    pub(crate) fn into_new_speech(self) -> Result<NewSpeech, cbspeech_core::CoreError> {
        let source: SpeechSource = self.source.parse()?;
        let speech = NewSpeech {
            source,
            speaker: self.speaker.trim().to_string(),
            title: self
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            content: self.content,
            published_at: self.published_at,
            url: self.url.trim().to_string(),
        };
        speech.validate()?;
        Ok(speech)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub invalid: usize,
}

/// Parse a JSON array of speech records.
pub(crate) fn parse_records(raw: &str) -> anyhow::Result<Vec<ImportRecord>> {
    serde_json::from_str(raw).context("expected a JSON array of speech records")
}

/// Import every record in `path`, skipping URLs already stored.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or an insert fails.
pub(crate) async fn run_import(pool: &sqlx::PgPool, path: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records = parse_records(&raw)?;
    tracing::info!(path = %path.display(), records = records.len(), "importing speeches");

    let mut summary = ImportSummary::default();
    for (i, record) in records.into_iter().enumerate() {
        let speech = match record.into_new_speech() {
            Ok(speech) => speech,
            Err(e) => {
                tracing::warn!(record = i, error = %e, "skipping invalid record");
                summary.invalid += 1;
                continue;
            }
        };

        match cbspeech_db::insert_speech(pool, &speech).await? {
            Some(id) => {
                tracing::debug!(id, url = %speech.url, "speech inserted");
                summary.inserted += 1;
            }
            None => {
                tracing::debug!(url = %speech.url, "speech already stored");
                summary.skipped += 1;
            }
        }
    }

    println!(
        "import complete: {} inserted, {} already stored, {} invalid",
        summary.inserted, summary.skipped, summary.invalid
    );
    Ok(())
}
