//! Document-level sentiment for central bank speeches.
//!
//! Splits long documents into chunks that fit a bounded-input classifier
//! (FinBERT served by TEI), scores each chunk, and averages the per-label
//! probabilities into a single verdict.

pub mod aggregate;
pub mod chunker;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod splitter;
pub mod tei;
pub mod tokenizer;
pub mod types;

#[cfg(test)]
mod test_support;

pub use aggregate::aggregate;
pub use chunker::{Chunk, ChunkBuilder, ChunkKind};
pub use classifier::ChunkClassifier;
pub use engine::SentimentEngine;
pub use error::SentimentError;
pub use pipeline::{run_analysis, AnalysisSummary, SpeechStore};
pub use splitter::{PeriodSplitter, SentenceSplitter};
pub use tei::TeiClassifier;
pub use tokenizer::{HfTokenCounter, TokenCounter};
pub use types::{
    Document, EngineConfig, Label, LabelDistribution, SentimentVerdict,
    DEFAULT_FALLBACK_PREFIX_LENGTH, DEFAULT_MODEL_TOKEN_LIMIT, DEFAULT_RESERVED_TOKENS,
};
