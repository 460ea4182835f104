//! Sentiment command handlers for the CLI.

mod query;
mod store;

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use cbspeech_core::AppConfig;
use cbspeech_sentiment::{
    Document, EngineConfig, HfTokenCounter, SentimentEngine, TeiClassifier,
};

pub(crate) use query::run_scores;
pub(crate) use store::PgStore;

pub(crate) type Engine = SentimentEngine<HfTokenCounter, TeiClassifier>;

/// Build the engine from configuration. Nothing is contacted until the
/// classifier is first used.
///
/// # Errors
///
/// Returns an error if the tokenizer file cannot be loaded or the HTTP
/// client cannot be built.
pub(crate) fn build_engine(config: &AppConfig) -> anyhow::Result<Engine> {
    let tokenizer = HfTokenCounter::from_file(&config.tokenizer_path).with_context(|| {
        format!(
            "failed to load tokenizer from {}",
            config.tokenizer_path.display()
        )
    })?;
    let classifier = TeiClassifier::new(&config.tei_url, config.classifier_timeout_secs)?
        .with_model_token_limit(config.model_token_limit);

    Ok(SentimentEngine::new(
        EngineConfig::from_app_config(config),
        tokenizer,
        classifier,
    ))
}

/// Resolve text from `--file`, the positional argument, or stdin, in that order.
///
/// # Errors
///
/// Returns an error if the input cannot be read or is blank.
pub(crate) fn read_input(file: Option<&Path>, text: Option<String>) -> anyhow::Result<String> {
    let input = match (file, text) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, Some(text)) => text,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    if input.trim().is_empty() {
        anyhow::bail!("no text to process");
    }
    Ok(input)
}

/// Print the chunk plan for `text` without contacting the classifier.
///
/// # Errors
///
/// Returns an error if the engine cannot be built or tokenization fails.
pub(crate) fn run_chunk(config: &AppConfig, text: &str) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let chunks = engine.chunk(text)?;

    println!(
        "{} chunk(s), budget {} tokens",
        chunks.len(),
        engine.config().max_tokens()
    );
    println!("{:<7}{:<14}{:<8}PREVIEW", "INDEX", "KIND", "TOKENS");
    for chunk in &chunks {
        println!(
            "{:<7}{:<14}{:<8}{}",
            chunk.index,
            chunk.kind.as_str(),
            chunk.token_count,
            preview(&chunk.text, 60)
        );
    }
    Ok(())
}

/// Score `text` and print the verdict as pretty JSON.
///
/// # Errors
///
/// Returns an error if the engine cannot be built, the classifier cannot be
/// loaded, or tokenization fails.
pub(crate) async fn run_score(config: &AppConfig, text: &str) -> anyhow::Result<()> {
    let engine = build_engine(config)?;
    let verdict = engine.analyze(&Document::new("input", text)).await?;
    if verdict.is_unscored() {
        tracing::warn!("no chunk could be classified; verdict is the neutral default");
    }
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

/// Analyze all stored speeches lacking a verdict for the configured model.
///
/// # Errors
///
/// Returns an error if the engine cannot be built, pending speeches cannot
/// be listed, or the classifier cannot be loaded. Per-speech failures are
/// logged and counted, not propagated.
pub(crate) async fn run_analyze(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    limit: Option<usize>,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        let limit = limit.map(i64::try_from).transpose()?;
        let pending =
            cbspeech_db::list_unanalyzed_speeches(pool, &config.model_name, limit).await?;
        println!(
            "dry-run: would analyze {} speech(es) with model '{}'",
            pending.len(),
            config.model_name
        );
        return Ok(());
    }

    let engine = build_engine(config)?;
    let store = PgStore::new(pool);
    let summary =
        cbspeech_sentiment::run_analysis(&engine, &store, &config.model_name, limit).await?;

    println!(
        "analysis complete: {} found, {} analyzed, {} failed",
        summary.found, summary.analyzed, summary.failed
    );
    Ok(())
}

/// First `max` characters of `text` on one line.
pub(crate) fn preview(text: &str, max: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("a\nb", 10), "a b");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("abc", 3), "abc");
    }

    #[test]
    fn positional_text_is_used_when_no_file() {
        let text = read_input(None, Some("Rates are on hold.".to_string())).unwrap();
        assert_eq!(text, "Rates are on hold.");
    }

    #[test]
    fn file_takes_precedence_over_text() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "From the file.").unwrap();

        let text = read_input(Some(file.path()), Some("ignored".to_string())).unwrap();
        assert_eq!(text, "From the file.");
    }

    #[test]
    fn blank_input_is_rejected() {
        assert!(read_input(None, Some("   \n".to_string())).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = read_input(Some(Path::new("/nonexistent/speech.txt")), None).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
