//! Document-level sentiment: chunk, classify, aggregate.

use tokio::sync::OnceCell;

use crate::aggregate::aggregate;
use crate::chunker::{Chunk, ChunkBuilder};
use crate::classifier::ChunkClassifier;
use crate::error::SentimentError;
use crate::splitter::{PeriodSplitter, SentenceSplitter};
use crate::tokenizer::TokenCounter;
use crate::types::{Document, EngineConfig, SentimentVerdict};

/// Scores whole documents with a bounded-input classifier.
///
/// Owns its tokenizer, splitter and classifier. The classifier is loaded
/// lazily, once, on first use.
pub struct SentimentEngine<T, C, S = PeriodSplitter> {
    config: EngineConfig,
    tokenizer: T,
    splitter: S,
    classifier: C,
    loaded: OnceCell<()>,
}

impl<T, C> SentimentEngine<T, C, PeriodSplitter>
where
    T: TokenCounter,
    C: ChunkClassifier,
{
    pub fn new(config: EngineConfig, tokenizer: T, classifier: C) -> Self {
        Self::with_splitter(config, tokenizer, PeriodSplitter, classifier)
    }
}

impl<T, C, S> SentimentEngine<T, C, S>
where
    T: TokenCounter,
    C: ChunkClassifier,
    S: SentenceSplitter,
{
    pub fn with_splitter(config: EngineConfig, tokenizer: T, splitter: S, classifier: C) -> Self {
        Self {
            config,
            tokenizer,
            splitter,
            classifier,
            loaded: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    /// Load the classifier if it has not been loaded yet.
    ///
    /// Subsequent calls are no-ops. A failed load is not cached, so the next
    /// call tries again.
    ///
    /// # Errors
    ///
    /// Returns the classifier's load error.
    pub async fn ensure_loaded(&self) -> Result<(), SentimentError> {
        self.loaded
            .get_or_try_init(|| async {
                self.classifier.load().await?;
                tracing::info!(
                    max_tokens = self.config.max_tokens(),
                    "sentiment classifier loaded"
                );
                Ok::<(), SentimentError>(())
            })
            .await?;
        Ok(())
    }

    /// Split `text` into token-bounded chunks without classifying them.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Tokenizer`] if the tokenizer fails.
    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>, SentimentError> {
        ChunkBuilder::new(&self.tokenizer, &self.splitter, &self.config).build(text)
    }

    /// Score one document.
    ///
    /// A chunk whose classification fails is logged and left out of the
    /// aggregate. If every chunk fails the verdict is the neutral zero
    /// verdict, with `chunk_count` still reporting how many chunks were built.
    ///
    /// Calling this repeatedly on the same document has no side effects
    /// beyond the first classifier load.
    ///
    /// # Errors
    ///
    /// Returns an error only if the classifier cannot be loaded or the
    /// tokenizer fails. Classification failures never surface here.
    pub async fn analyze(&self, document: &Document) -> Result<SentimentVerdict, SentimentError> {
        self.ensure_loaded().await?;

        let chunks = self.chunk(&document.text)?;
        tracing::info!(document = %document.id, chunks = chunks.len(), "analyzing document");

        let mut distributions = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            match self.classifier.classify(&chunk.text).await {
                Ok(dist) => distributions.push(dist),
                Err(e) => {
                    tracing::warn!(
                        document = %document.id,
                        chunk = chunk.index,
                        tokens = chunk.token_count,
                        error = %e,
                        "chunk classification failed; excluding it from the aggregate"
                    );
                }
            }
        }

        if distributions.is_empty() {
            tracing::warn!(
                document = %document.id,
                chunks = chunks.len(),
                "every chunk failed classification; returning neutral zero verdict"
            );
        }

        Ok(aggregate(&distributions).with_chunk_count(chunks.len()))
    }
}
