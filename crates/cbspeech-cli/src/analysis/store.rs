//! Postgres-backed [`SpeechStore`].

use cbspeech_db::NewSentimentScore;
use cbspeech_sentiment::{Document, SentimentError, SentimentVerdict, SpeechStore};

pub(crate) struct PgStore<'a> {
    pool: &'a sqlx::PgPool,
}

impl<'a> PgStore<'a> {
    pub(crate) fn new(pool: &'a sqlx::PgPool) -> Self {
        Self { pool }
    }
}

fn storage(e: impl std::fmt::Display) -> SentimentError {
    SentimentError::Storage(e.to_string())
}

/// Map a verdict for a stored speech onto a `sentiment_scores` row.
pub(crate) fn score_row<'v>(
    document_id: &str,
    model_name: &'v str,
    verdict: &SentimentVerdict,
) -> Result<NewSentimentScore<'v>, SentimentError> {
    let speech_id: i64 = document_id
        .parse()
        .map_err(|e| storage(format!("invalid speech id '{document_id}': {e}")))?;
    let chunk_count = i32::try_from(verdict.chunk_count).map_err(storage)?;

    Ok(NewSentimentScore {
        speech_id,
        model_name,
        sentiment: verdict.label.as_str(),
        score: verdict.score,
        positive: verdict.positive,
        negative: verdict.negative,
        neutral: verdict.neutral,
        chunk_count,
    })
}

impl SpeechStore for PgStore<'_> {
    async fn pending_documents(
        &self,
        model_name: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, SentimentError> {
        let limit = limit.map(i64::try_from).transpose().map_err(storage)?;
        let rows = cbspeech_db::list_unanalyzed_speeches(self.pool, model_name, limit)
            .await
            .map_err(storage)?;
        Ok(rows
            .into_iter()
            .map(|row| Document::new(row.id.to_string(), row.content))
            .collect())
    }

    async fn save_verdict(
        &self,
        document: &Document,
        model_name: &str,
        verdict: &SentimentVerdict,
    ) -> Result<(), SentimentError> {
        let row = score_row(&document.id, model_name, verdict)?;
        cbspeech_db::insert_sentiment_score(self.pool, &row)
            .await
            .map_err(storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbspeech_sentiment::Label;

    fn verdict() -> SentimentVerdict {
        SentimentVerdict {
            label: Label::Negative,
            score: 0.61,
            positive: 0.1,
            negative: 0.61,
            neutral: 0.29,
            chunk_count: 4,
            classified_chunks: 4,
        }
    }

    #[test]
    fn verdict_maps_to_row() {
        let row = score_row("42", "finbert", &verdict()).unwrap();
        assert_eq!(row.speech_id, 42);
        assert_eq!(row.model_name, "finbert");
        assert_eq!(row.sentiment, "negative");
        assert_eq!(row.chunk_count, 4);
        assert!((row.neutral - 0.29).abs() < 1e-12);
    }

    #[test]
    fn non_numeric_document_id_is_a_storage_error() {
        let err = score_row("speech-42", "finbert", &verdict()).unwrap_err();
        assert!(matches!(err, SentimentError::Storage(ref m) if m.contains("speech-42")));
    }
}
