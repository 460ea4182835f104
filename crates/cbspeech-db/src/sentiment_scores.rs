//! Database operations for the `sentiment_scores` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// Decimal places kept by the `NUMERIC(6,4)` score columns.
const SCORE_SCALE: u32 = 4;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `sentiment_scores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SentimentScoreRow {
    pub id: i64,
    pub speech_id: i64,
    pub model_name: String,
    pub sentiment: String,
    pub score: Decimal,
    pub positive_score: Decimal,
    pub negative_score: Decimal,
    pub neutral_score: Decimal,
    pub chunk_count: i32,
    pub analyzed_at: DateTime<Utc>,
}

/// A verdict ready to be stored. Scores are rounded on insert.
#[derive(Debug, Clone)]
pub struct NewSentimentScore<'a> {
    pub speech_id: i64,
    pub model_name: &'a str,
    pub sentiment: &'a str,
    pub score: f64,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    pub chunk_count: i32,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert a verdict and return its generated id.
///
/// Scores are rounded to four decimal places. A second verdict for the same
/// `(speech_id, model_name)` is a unique-constraint violation.
///
/// # Errors
///
/// Returns [`DbError::InvalidScore`] if a score is not finite, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_sentiment_score(
    pool: &PgPool,
    row: &NewSentimentScore<'_>,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO sentiment_scores \
             (speech_id, model_name, sentiment, score, positive_score, negative_score, \
              neutral_score, chunk_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(row.speech_id)
    .bind(row.model_name)
    .bind(row.sentiment)
    .bind(to_score("score", row.score)?)
    .bind(to_score("positive_score", row.positive)?)
    .bind(to_score("negative_score", row.negative)?)
    .bind(to_score("neutral_score", row.neutral)?)
    .bind(row.chunk_count)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Most recent verdicts for `model_name`.
///
/// Results are ordered by `analyzed_at DESC` then `id DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sentiment_scores(
    pool: &PgPool,
    model_name: &str,
    limit: i64,
) -> Result<Vec<SentimentScoreRow>, DbError> {
    let rows = sqlx::query_as::<_, SentimentScoreRow>(
        "SELECT id, speech_id, model_name, sentiment, score, positive_score, negative_score, \
                neutral_score, chunk_count, analyzed_at \
         FROM sentiment_scores \
         WHERE model_name = $1 \
         ORDER BY analyzed_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(model_name)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Convert a probability to the stored four-place decimal.
pub(crate) fn to_score(field: &'static str, value: f64) -> Result<Decimal, DbError> {
    Decimal::try_from(value)
        .map(|d| d.round_dp(SCORE_SCALE))
        .map_err(|_| DbError::InvalidScore { field, value })
}
