//! Deterministic stand-ins for the tokenizer and classifier.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::classifier::ChunkClassifier;
use crate::error::SentimentError;
use crate::tokenizer::TokenCounter;
use crate::types::LabelDistribution;

/// One token per character; decoding is exact.
pub(crate) struct CharCounter;

impl TokenCounter for CharCounter {
    fn encode(&self, text: &str) -> Result<Vec<u32>, SentimentError> {
        Ok(text.chars().map(u32::from).collect())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, SentimentError> {
        Ok(ids.iter().filter_map(|&id| char::from_u32(id)).collect())
    }
}

const BOUNDARY_TOKEN: u32 = u32::MAX;

/// Like [`CharCounter`], but every `". "` costs one extra token, so joined
/// sentences are longer than the sum of their parts.
pub(crate) struct BoundaryCounter;

impl TokenCounter for BoundaryCounter {
    fn encode(&self, text: &str) -> Result<Vec<u32>, SentimentError> {
        let mut ids = Vec::new();
        let mut prev = None;
        for c in text.chars() {
            ids.push(u32::from(c));
            if prev == Some('.') && c == ' ' {
                ids.push(BOUNDARY_TOKEN);
            }
            prev = Some(c);
        }
        Ok(ids)
    }

    fn decode(&self, ids: &[u32]) -> Result<String, SentimentError> {
        Ok(ids
            .iter()
            .filter(|&&id| id != BOUNDARY_TOKEN)
            .filter_map(|&id| char::from_u32(id))
            .collect())
    }
}

const CONTINUATION: u32 = 1 << 31;

/// One token per character, with WordPiece-style word continuations: a
/// window decoded from the middle of a word comes back prefixed with `"##"`,
/// which re-encodes to two more tokens than the window held.
pub(crate) struct WordPieceCounter;

impl TokenCounter for WordPieceCounter {
    fn encode(&self, text: &str) -> Result<Vec<u32>, SentimentError> {
        let mut ids = Vec::new();
        let mut prev: Option<char> = None;
        for c in text.chars() {
            let mid_word = !c.is_whitespace() && prev.is_some_and(|p| !p.is_whitespace());
            ids.push(if mid_word { u32::from(c) | CONTINUATION } else { u32::from(c) });
            prev = Some(c);
        }
        Ok(ids)
    }

    fn decode(&self, ids: &[u32]) -> Result<String, SentimentError> {
        let mut text = String::new();
        if ids.first().is_some_and(|&id| id & CONTINUATION != 0) {
            text.push_str("##");
        }
        text.extend(ids.iter().filter_map(|&id| char::from_u32(id & !CONTINUATION)));
        Ok(text)
    }
}

/// One token per character, but `'~'` decodes to `"~~"`, so any window
/// holding one re-encodes longer than it was.
pub(crate) struct ExpandingCounter;

impl TokenCounter for ExpandingCounter {
    fn encode(&self, text: &str) -> Result<Vec<u32>, SentimentError> {
        Ok(text.chars().map(u32::from).collect())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, SentimentError> {
        let mut text = String::new();
        for c in ids.iter().filter_map(|&id| char::from_u32(id)) {
            if c == '~' {
                text.push('~');
            }
            text.push(c);
        }
        Ok(text)
    }
}

/// A tokenizer whose backend is broken.
pub(crate) struct FailingCounter;

impl TokenCounter for FailingCounter {
    fn encode(&self, _text: &str) -> Result<Vec<u32>, SentimentError> {
        Err(SentimentError::Tokenizer("vocabulary not loaded".to_string()))
    }

    fn decode(&self, _ids: &[u32]) -> Result<String, SentimentError> {
        Err(SentimentError::Tokenizer("vocabulary not loaded".to_string()))
    }
}

type Respond = dyn Fn(&str) -> Result<LabelDistribution, SentimentError> + Send + Sync;

/// Classifier answering from a closure, counting loads and calls.
pub(crate) struct ScriptedClassifier {
    respond: Box<Respond>,
    fail_load: bool,
    pub(crate) loads: AtomicUsize,
    pub(crate) calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub(crate) fn new<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Result<LabelDistribution, SentimentError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            fail_load: false,
            loads: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always returns the same distribution.
    pub(crate) fn constant(dist: LabelDistribution) -> Self {
        Self::new(move |_| Ok(dist))
    }

    pub(crate) fn failing_load() -> Self {
        let mut classifier = Self::constant(LabelDistribution::new(0.0, 0.0, 1.0));
        classifier.fail_load = true;
        classifier
    }

    pub(crate) fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChunkClassifier for ScriptedClassifier {
    async fn load(&self) -> Result<(), SentimentError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            return Err(SentimentError::Tei("model unavailable".to_string()));
        }
        Ok(())
    }

    async fn classify(&self, text: &str) -> Result<LabelDistribution, SentimentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(text)
    }
}
