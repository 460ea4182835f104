//! Boundary to the external sentiment model.

use std::future::Future;

use crate::error::SentimentError;
use crate::types::LabelDistribution;

/// Scores one bounded span of text.
///
/// Inputs are always within the engine's token budget. Implementations
/// must not truncate silently; an input they cannot score is an error.
pub trait ChunkClassifier {
    /// Prepare the model. Called at most once per engine until it succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be made ready.
    fn load(&self) -> impl Future<Output = Result<(), SentimentError>> + Send {
        async { Ok(()) }
    }

    /// Return the label distribution for `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if classification fails; the engine skips that chunk.
    fn classify(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<LabelDistribution, SentimentError>> + Send;
}
