//! Token counting against the classifier's vocabulary.

use std::path::Path;

use tokenizers::Tokenizer;

use crate::error::SentimentError;

/// Reversible tokenizer used to measure chunks against the token budget.
///
/// Implementations must be deterministic and `count(t)` must equal
/// `encode(t).len()`. Exact textual round-trip through `decode` is not
/// required.
pub trait TokenCounter {
    /// Encode `text` without classifier boundary tokens.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Tokenizer`] if the underlying tokenizer fails.
    fn encode(&self, text: &str) -> Result<Vec<u32>, SentimentError>;

    /// Decode token ids back to text.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Tokenizer`] if the underlying tokenizer fails.
    fn decode(&self, ids: &[u32]) -> Result<String, SentimentError>;

    /// Number of tokens `text` encodes to.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Tokenizer`] if the underlying tokenizer fails.
    fn count(&self, text: &str) -> Result<usize, SentimentError> {
        Ok(self.encode(text)?.len())
    }
}

/// [`TokenCounter`] backed by a HuggingFace `tokenizer.json`.
///
/// Must be the tokenizer of the model behind the classifier, otherwise the
/// budget no longer predicts what the classifier sees.
pub struct HfTokenCounter {
    inner: Tokenizer,
}

impl HfTokenCounter {
    /// Load a tokenizer from a `tokenizer.json` file.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Tokenizer`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SentimentError> {
        let path = path.as_ref();
        let inner = Tokenizer::from_file(path).map_err(|e| {
            SentimentError::Tokenizer(format!("failed to load {}: {e}", path.display()))
        })?;
        Self::new(inner)
    }

    /// Load a tokenizer from the bytes of a `tokenizer.json`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Tokenizer`] if the bytes are not a valid tokenizer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SentimentError> {
        let inner = Tokenizer::from_bytes(bytes)
            .map_err(|e| SentimentError::Tokenizer(format!("invalid tokenizer: {e}")))?;
        Self::new(inner)
    }

    // Truncation in the tokenizer file would make long texts look like they fit.
    fn new(mut inner: Tokenizer) -> Result<Self, SentimentError> {
        inner
            .with_truncation(None)
            .map_err(|e| SentimentError::Tokenizer(format!("cannot disable truncation: {e}")))?;
        inner.with_padding(None);
        Ok(Self { inner })
    }
}

impl TokenCounter for HfTokenCounter {
    fn encode(&self, text: &str) -> Result<Vec<u32>, SentimentError> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| SentimentError::Tokenizer(format!("encode failed: {e}")))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, SentimentError> {
        self.inner
            .decode(ids, true)
            .map_err(|e| SentimentError::Tokenizer(format!("decode failed: {e}")))
    }
}
