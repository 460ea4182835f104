//! Read-only verdict queries.

/// Show recently stored verdicts for `model_name`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_scores(
    pool: &sqlx::PgPool,
    model_name: &str,
    limit: i64,
) -> anyhow::Result<()> {
    let rows = cbspeech_db::list_sentiment_scores(pool, model_name, limit).await?;

    if rows.is_empty() {
        println!("no verdicts stored for model '{model_name}'; run `analyze` first");
        return Ok(());
    }

    println!(
        "{:<9}{:<11}{:<9}{:<9}{:<9}{:<9}{:<8}ANALYZED",
        "SPEECH", "SENTIMENT", "SCORE", "POS", "NEG", "NEU", "CHUNKS"
    );
    for row in &rows {
        let analyzed = row.analyzed_at.format("%Y-%m-%d %H:%M").to_string();
        println!(
            "{:<9}{:<11}{:<9}{:<9}{:<9}{:<9}{:<8}{}",
            row.speech_id,
            row.sentiment,
            row.score,
            row.positive_score,
            row.negative_score,
            row.neutral_score,
            row.chunk_count,
            analyzed
        );
    }

    Ok(())
}
