//! Batch analysis of stored speeches.

use std::future::Future;

use crate::classifier::ChunkClassifier;
use crate::engine::SentimentEngine;
use crate::error::SentimentError;
use crate::splitter::SentenceSplitter;
use crate::tokenizer::TokenCounter;
use crate::types::{Document, SentimentVerdict};

/// Storage as seen by the analysis runner.
pub trait SpeechStore {
    /// Documents with no verdict yet for `model_name`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Storage`] if the query fails.
    fn pending_documents(
        &self,
        model_name: &str,
        limit: Option<usize>,
    ) -> impl Future<Output = Result<Vec<Document>, SentimentError>> + Send;

    /// Persist a verdict keyed by document id and model name.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Storage`] if the write fails.
    fn save_verdict(
        &self,
        document: &Document,
        model_name: &str,
        verdict: &SentimentVerdict,
    ) -> impl Future<Output = Result<(), SentimentError>> + Send;
}

/// Outcome of one [`run_analysis`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    /// Documents that lacked a verdict when the run started.
    pub found: usize,
    /// Verdicts persisted.
    pub analyzed: usize,
    /// Documents left without a verdict; a later run picks them up again.
    pub failed: usize,
}

/// Analyze every document lacking a verdict for `model_name`.
///
/// Documents are processed one at a time. A document whose chunks all fail
/// classification is not persisted, so it stays pending. Per-document
/// failures are logged and counted, never fatal to the batch.
///
/// # Errors
///
/// Returns an error if pending documents cannot be listed or the classifier
/// cannot be loaded.
pub async fn run_analysis<T, C, S, St>(
    engine: &SentimentEngine<T, C, S>,
    store: &St,
    model_name: &str,
    limit: Option<usize>,
) -> Result<AnalysisSummary, SentimentError>
where
    T: TokenCounter,
    C: ChunkClassifier,
    S: SentenceSplitter,
    St: SpeechStore,
{
    let documents = store.pending_documents(model_name, limit).await?;
    let mut summary = AnalysisSummary {
        found: documents.len(),
        ..AnalysisSummary::default()
    };
    tracing::info!(model = model_name, found = summary.found, "starting sentiment analysis");

    if documents.is_empty() {
        tracing::info!(model = model_name, "no new documents to analyze");
        return Ok(summary);
    }

    engine.ensure_loaded().await?;

    for (i, document) in documents.iter().enumerate() {
        tracing::info!(
            document = %document.id,
            progress = format_args!("{}/{}", i + 1, summary.found),
            "analyzing"
        );

        let verdict = match engine.analyze(document).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(document = %document.id, error = %e, "analysis failed");
                summary.failed += 1;
                continue;
            }
        };

        if verdict.is_unscored() {
            tracing::error!(
                document = %document.id,
                chunks = verdict.chunk_count,
                "no chunk could be classified; leaving document for a later run"
            );
            summary.failed += 1;
            continue;
        }

        match store.save_verdict(document, model_name, &verdict).await {
            Ok(()) => {
                tracing::info!(
                    document = %document.id,
                    sentiment = %verdict.label,
                    positive = format_args!("{:.3}", verdict.positive),
                    negative = format_args!("{:.3}", verdict.negative),
                    neutral = format_args!("{:.3}", verdict.neutral),
                    chunks = verdict.chunk_count,
                    "verdict stored"
                );
                summary.analyzed += 1;
            }
            Err(e) => {
                tracing::error!(document = %document.id, error = %e, "failed to store verdict");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        model = model_name,
        analyzed = summary.analyzed,
        failed = summary.failed,
        found = summary.found,
        "sentiment analysis complete"
    );
    Ok(summary)
}
