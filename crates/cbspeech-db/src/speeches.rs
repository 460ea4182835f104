//! Database operations for the `speeches` table.

use cbspeech_core::NewSpeech;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `speeches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpeechRow {
    pub id: i64,
    pub source: String,
    pub speaker: String,
    pub title: Option<String>,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub ingested_at: DateTime<Utc>,
}

/// Insert a speech unless one with the same URL already exists.
///
/// Returns the new row's id, or `None` if the URL was already stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_speech(pool: &PgPool, speech: &NewSpeech) -> Result<Option<i64>, DbError> {
    let id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO speeches (source, speaker, title, content, published_at, url) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (url) DO NOTHING \
         RETURNING id",
    )
    .bind(speech.source.as_str())
    .bind(&speech.speaker)
    .bind(speech.title.as_deref())
    .bind(&speech.content)
    .bind(speech.published_at)
    .bind(&speech.url)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Speeches with no `sentiment_scores` row for `model_name`.
///
/// Ordered by `published_at ASC` then `id ASC`, so a capped batch always
/// takes the oldest backlog first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unanalyzed_speeches(
    pool: &PgPool,
    model_name: &str,
    limit: Option<i64>,
) -> Result<Vec<SpeechRow>, DbError> {
    let rows = sqlx::query_as::<_, SpeechRow>(
        "SELECT s.id, s.source, s.speaker, s.title, s.content, s.published_at, s.url, \
                s.ingested_at \
         FROM speeches s \
         WHERE NOT EXISTS ( \
             SELECT 1 FROM sentiment_scores ss \
             WHERE ss.speech_id = s.id AND ss.model_name = $1 \
         ) \
         ORDER BY s.published_at ASC, s.id ASC \
         LIMIT $2",
    )
    .bind(model_name)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
