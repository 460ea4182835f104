//! Packing of document text into token-bounded chunks.
//!
//! Every chunk produced here tokenizes to at most
//! [`EngineConfig::max_tokens`] tokens under the engine's [`TokenCounter`].
//! A chunk that exceeded it would be silently truncated by the classifier.
//!
//! The one exception is a single token whose decoded text re-encodes over
//! the budget (possible only with very small budgets). It cannot be cut
//! further, so it is emitted with its real `token_count` and a warning.

use serde::Serialize;

use crate::error::SentimentError;
use crate::splitter::SentenceSplitter;
use crate::tokenizer::TokenCounter;
use crate::types::EngineConfig;

/// How a chunk was formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// The whole document fit in the budget.
    Whole,
    /// One or more consecutive sentences.
    Sentences,
    /// A token-level window of a sentence too long to fit on its own.
    TokenWindow,
    /// Bounded prefix of the raw text when nothing else was produced.
    Fallback,
}

impl ChunkKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkKind::Whole => "whole",
            ChunkKind::Sentences => "sentences",
            ChunkKind::TokenWindow => "token_window",
            ChunkKind::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in document order.
    pub index: usize,
    pub text: String,
    pub token_count: usize,
    pub kind: ChunkKind,
}

/// Greedy sentence packer with token-window fallback.
pub struct ChunkBuilder<'a, T: ?Sized, S: ?Sized> {
    counter: &'a T,
    splitter: &'a S,
    max_tokens: usize,
    fallback_prefix_length: usize,
}

impl<'a, T, S> ChunkBuilder<'a, T, S>
where
    T: TokenCounter + ?Sized,
    S: SentenceSplitter + ?Sized,
{
    pub fn new(counter: &'a T, splitter: &'a S, config: &EngineConfig) -> Self {
        Self {
            counter,
            splitter,
            max_tokens: config.max_tokens(),
            fallback_prefix_length: config.fallback_prefix_length,
        }
    }

    #[must_use]
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Split `text` into chunks in document order.
    ///
    /// 1. A document that fits the budget is returned as a single chunk.
    /// 2. Otherwise sentences are packed greedily; each candidate group is
    ///    re-tokenized as the exact string that would be emitted.
    /// 3. A sentence that does not fit on its own is cut into consecutive
    ///    windows of `max_tokens` tokens, decoded back to text.
    /// 4. If nothing was produced, a bounded prefix of the raw text is used.
    ///
    /// Always returns at least one chunk.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Tokenizer`] only if the tokenizer itself fails.
    /// The content of `text` never causes an error.
    pub fn build(&self, text: &str) -> Result<Vec<Chunk>, SentimentError> {
        let whole_tokens = self.counter.count(text)?;
        if whole_tokens <= self.max_tokens {
            tracing::debug!(tokens = whole_tokens, "document fits in a single chunk");
            return Ok(vec![Chunk {
                index: 0,
                text: text.to_string(),
                token_count: whole_tokens,
                kind: ChunkKind::Whole,
            }]);
        }

        let sentences = self.splitter.split(text);
        let last = sentences.len().saturating_sub(1);

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        let mut pending_text = String::new();
        let mut pending_tokens = 0;

        for (i, sentence) in sentences.iter().enumerate() {
            // A group ending before the last sentence gets its terminator back.
            let terminated = i < last;

            pending.push(sentence.as_str());
            // Counted on the joined text: neighbouring text can change how a
            // boundary tokenizes, so per-sentence counts do not add up.
            let trial_text = self.render(&pending, terminated);
            let trial_tokens = self.counter.count(&trial_text)?;
            if trial_tokens <= self.max_tokens {
                pending_text = trial_text;
                pending_tokens = trial_tokens;
                continue;
            }
            pending.pop();

            let alone = if pending.is_empty() {
                trial_text
            } else {
                push_chunk(
                    &mut chunks,
                    std::mem::take(&mut pending_text),
                    pending_tokens,
                    ChunkKind::Sentences,
                );
                pending.clear();
                self.render(&[sentence.as_str()], terminated)
            };

            let ids = self.counter.encode(&alone)?;
            if ids.len() <= self.max_tokens {
                pending.push(sentence.as_str());
                pending_text = alone;
                pending_tokens = ids.len();
            } else {
                self.split_by_tokens(&ids, &mut chunks)?;
            }
        }

        if !pending.is_empty() {
            push_chunk(&mut chunks, pending_text, pending_tokens, ChunkKind::Sentences);
        }

        if chunks.is_empty() {
            tracing::warn!("no chunks produced; falling back to a bounded prefix");
            chunks.push(self.fallback(text)?);
        }

        tracing::debug!(
            chunks = chunks.len(),
            sentences = sentences.len(),
            max_tokens = self.max_tokens,
            "document split into chunks"
        );
        Ok(chunks)
    }

    fn render(&self, sentences: &[&str], terminated: bool) -> String {
        let mut text = sentences.join(self.splitter.separator());
        if terminated {
            text.push_str(self.splitter.terminator());
        }
        text
    }

    fn split_by_tokens(&self, ids: &[u32], chunks: &mut Vec<Chunk>) -> Result<(), SentimentError> {
        tracing::debug!(
            tokens = ids.len(),
            max_tokens = self.max_tokens,
            "sentence exceeds budget; splitting into token windows"
        );
        let mut start = 0;
        while start < ids.len() {
            let (text, token_count, end) = self.fit_window(ids, start)?;
            push_chunk(chunks, text, token_count, ChunkKind::TokenWindow);
            start = end;
        }
        Ok(())
    }

    /// Decode the longest window of `ids` starting at `start` whose text
    /// still fits the budget, returning the text, its token count and the
    /// window end.
    ///
    /// Decoded text can re-encode to more tokens than the window held, so
    /// the window shrinks one token at a time until it fits.
    fn fit_window(
        &self,
        ids: &[u32],
        start: usize,
    ) -> Result<(String, usize, usize), SentimentError> {
        let mut end = (start + self.max_tokens).min(ids.len());
        loop {
            let text = self.counter.decode(&ids[start..end])?;
            let token_count = self.counter.count(&text)?;
            if token_count <= self.max_tokens {
                return Ok((text, token_count, end));
            }
            if end - start == 1 {
                tracing::warn!(
                    token_count,
                    max_tokens = self.max_tokens,
                    "single token decodes over budget; emitting chunk as is"
                );
                return Ok((text, token_count, end));
            }
            end -= 1;
        }
    }

    fn fallback(&self, text: &str) -> Result<Chunk, SentimentError> {
        let prefix: String = text.chars().take(self.fallback_prefix_length).collect();
        let ids = self.counter.encode(&prefix)?;

        let (text, token_count) = if ids.len() <= self.max_tokens {
            (prefix, ids.len())
        } else {
            let (trimmed, count, _) = self.fit_window(&ids, 0)?;
            (trimmed, count)
        };

        Ok(Chunk {
            index: 0,
            text,
            token_count,
            kind: ChunkKind::Fallback,
        })
    }
}

fn push_chunk(chunks: &mut Vec<Chunk>, text: String, token_count: usize, kind: ChunkKind) {
    let index = chunks.len();
    chunks.push(Chunk {
        index,
        text,
        token_count,
        kind,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::PeriodSplitter;
    use crate::test_support::{BoundaryCounter, CharCounter, ExpandingCounter, WordPieceCounter};

    fn config(max_tokens: usize) -> EngineConfig {
        EngineConfig {
            model_token_limit: max_tokens + 2,
            reserved_tokens: 2,
            fallback_prefix_length: 2000,
        }
    }

    fn build(text: &str, max_tokens: usize) -> Vec<Chunk> {
        ChunkBuilder::new(&CharCounter, &PeriodSplitter, &config(max_tokens))
            .build(text)
            .unwrap()
    }

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    fn content(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .collect()
    }

    /// Splitter that never finds a sentence.
    struct NothingSplitter;

    impl SentenceSplitter for NothingSplitter {
        fn split(&self, _text: &str) -> Vec<String> {
            Vec::new()
        }

        fn separator(&self) -> &str {
            " "
        }

        fn terminator(&self) -> &str {
            ""
        }
    }

    #[test]
    fn document_within_budget_is_one_whole_chunk() {
        let text = "Rates rose. Inflation fell.";
        let chunks = build(text, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].kind, ChunkKind::Whole);
        assert_eq!(chunks[0].token_count, text.chars().count());
    }

    #[test]
    fn single_short_sentence_is_one_chunk() {
        let chunks = build("A.", 510);
        assert_eq!(texts(&chunks), vec!["A."]);
    }

    #[test]
    fn empty_document_still_yields_one_chunk() {
        let chunks = build("", 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "");
    }

    #[test]
    fn sentences_are_packed_greedily() {
        let chunks = build("aaaa. bbbb. cccc", 11);
        assert_eq!(texts(&chunks), vec!["aaaa. bbbb.", "cccc"]);
        assert!(chunks.iter().all(|c| c.kind == ChunkKind::Sentences));
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn restored_terminator_counts_against_the_budget() {
        // "aaaa. bbbb." is 11 tokens once its period is restored.
        let chunks = build("aaaa. bbbb. cccc", 10);
        assert_eq!(texts(&chunks), vec!["aaaa.", "bbbb. cccc"]);
    }

    #[test]
    fn boundary_tokens_are_counted_on_joined_text() {
        // Each ". " costs an extra token only once sentences are joined.
        let config = config(8);
        let chunks = ChunkBuilder::new(&BoundaryCounter, &PeriodSplitter, &config)
            .build("aaa. bbb")
            .unwrap();
        assert_eq!(texts(&chunks), vec!["aaa.", "bbb"]);
        for chunk in &chunks {
            assert!(BoundaryCounter.count(&chunk.text).unwrap() <= 8);
        }
    }

    #[test]
    fn oversized_sentence_is_split_into_token_windows() {
        let text = "x".repeat(25);
        let chunks = build(&text, 10);
        assert_eq!(chunks.len(), 3, "expected ceil(25 / 10) windows");
        assert!(chunks.iter().all(|c| c.kind == ChunkKind::TokenWindow));
        let counts: Vec<usize> = chunks.iter().map(|c| c.token_count).collect();
        assert_eq!(counts, vec![10, 10, 5]);
    }

    #[test]
    fn pending_group_is_flushed_before_a_hard_split() {
        let long = "y".repeat(12);
        let text = format!("intro. {long}. outro");
        let chunks = build(&text, 8);

        assert_eq!(chunks[0].text, "intro.");
        assert_eq!(chunks[0].kind, ChunkKind::Sentences);
        // "yyyyyyyyyyyy." is 13 tokens: two windows.
        assert_eq!(chunks[1].kind, ChunkKind::TokenWindow);
        assert_eq!(chunks[2].kind, ChunkKind::TokenWindow);
        assert_eq!(chunks[1].text, "yyyyyyyy");
        assert_eq!(chunks[2].text, "yyyy.");
        assert_eq!(chunks[3].text, "outro");
        assert_eq!(chunks[3].kind, ChunkKind::Sentences);
    }

    #[test]
    fn sentence_after_hard_split_starts_a_fresh_group() {
        let text = format!("{}. ab. cd", "z".repeat(9));
        let chunks = build(&text, 6);
        let kinds: Vec<ChunkKind> = chunks.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChunkKind::TokenWindow,
                ChunkKind::TokenWindow,
                ChunkKind::Sentences
            ]
        );
        assert_eq!(chunks[2].text, "ab. cd");
    }

    #[test]
    fn token_windows_shrink_when_decoding_adds_tokens() {
        let config = config(5);
        let text = "abcdefghijklmn";
        let chunks = ChunkBuilder::new(&WordPieceCounter, &PeriodSplitter, &config)
            .build(text)
            .unwrap();

        // Windows after the first start mid-word and pick up "##".
        assert_eq!(texts(&chunks), vec!["abcde", "##fgh", "##ijk", "##lmn"]);
        for chunk in &chunks {
            assert_eq!(chunk.kind, ChunkKind::TokenWindow);
            let actual = WordPieceCounter.count(&chunk.text).unwrap();
            assert!(actual <= 5, "chunk {:?} has {actual} tokens", chunk.text);
            assert_eq!(chunk.token_count, actual);
        }
        let rebuilt: String = chunks.iter().map(|c| c.text.replace('#', "")).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn shrunk_windows_respect_budget_and_cover_sentence() {
        let text = "Monetary policy remains sufficiently restrictive for now";
        for max_tokens in 3..=20 {
            let config = config(max_tokens);
            let chunks = ChunkBuilder::new(&WordPieceCounter, &PeriodSplitter, &config)
                .build(text)
                .unwrap();
            for chunk in &chunks {
                let actual = WordPieceCounter.count(&chunk.text).unwrap();
                assert!(
                    actual <= max_tokens,
                    "chunk {:?} has {actual} tokens, budget {max_tokens}",
                    chunk.text
                );
                assert_eq!(chunk.token_count, actual);
            }
            let rebuilt: String = chunks
                .iter()
                .map(|c| content(&c.text.replace('#', "")))
                .collect();
            assert_eq!(rebuilt, content(text), "budget {max_tokens}");
        }
    }

    #[test]
    fn single_token_over_budget_is_emitted_with_its_real_count() {
        let config = config(1);
        let chunks = ChunkBuilder::new(&WordPieceCounter, &PeriodSplitter, &config)
            .build("abc")
            .unwrap();
        assert_eq!(texts(&chunks), vec!["a", "##b", "##c"]);
        let counts: Vec<usize> = chunks.iter().map(|c| c.token_count).collect();
        assert_eq!(counts, vec![1, 3, 3]);
    }

    #[test]
    fn no_sentences_falls_back_to_trimmed_prefix() {
        let config = config(10);
        let text = "q".repeat(30);
        let chunks = ChunkBuilder::new(&CharCounter, &NothingSplitter, &config)
            .build(&text)
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Fallback);
        assert_eq!(chunks[0].text, "q".repeat(10));
        assert_eq!(chunks[0].token_count, 10);
    }

    #[test]
    fn fallback_prefix_shrinks_when_decoding_adds_tokens() {
        let config = config(4);
        let chunks = ChunkBuilder::new(&ExpandingCounter, &NothingSplitter, &config)
            .build("~~~~~~")
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Fallback);
        // Two ids decode to four characters, the most that fits.
        assert_eq!(chunks[0].text, "~~~~");
        assert_eq!(chunks[0].token_count, 4);
    }

    #[test]
    fn fallback_uses_configured_prefix_length() {
        let config = EngineConfig {
            model_token_limit: 12,
            reserved_tokens: 2,
            fallback_prefix_length: 4,
        };
        let chunks = ChunkBuilder::new(&CharCounter, &NothingSplitter, &config)
            .build("abcdefghijklmnopqrstuvwxyz")
            .unwrap();
        assert_eq!(chunks[0].text, "abcd");
        assert_eq!(chunks[0].kind, ChunkKind::Fallback);
    }

    fn corpus() -> Vec<String> {
        vec![
            "The Governing Council decided to keep the three key ECB interest rates unchanged. \
             Inflation continues to decline. Underlying price pressures remain high.\n\
             Wage growth is moderating. The economy is expected to recover"
                .to_string(),
            "a. b. c. d. e. f. g. h. i. j. k".to_string(),
            format!("short. {}. tail. end", "w".repeat(57)),
            "no sentence boundary but quite a long run of words in one line".to_string(),
            "Ends with separator. ".to_string(),
            "x".to_string(),
        ]
    }

    #[test]
    fn every_chunk_respects_the_budget() {
        for text in corpus() {
            for max_tokens in 1..=40 {
                let chunks = build(&text, max_tokens);
                for chunk in &chunks {
                    let actual = CharCounter.count(&chunk.text).unwrap();
                    assert!(
                        actual <= max_tokens,
                        "chunk {:?} has {actual} tokens, budget {max_tokens}",
                        chunk.text
                    );
                    assert_eq!(chunk.token_count, actual);
                }
            }
        }
    }

    #[test]
    fn chunks_cover_the_document_in_order() {
        for text in corpus() {
            for max_tokens in [1, 3, 7, 16, 40, 1000] {
                let chunks = build(&text, max_tokens);
                let rebuilt: String = chunks.iter().map(|c| content(&c.text)).collect();
                assert_eq!(rebuilt, content(&text), "budget {max_tokens}");
            }
        }
    }

    #[test]
    fn non_empty_documents_always_yield_chunks() {
        for text in corpus() {
            for max_tokens in [1, 2, 5, 50] {
                assert!(!build(&text, max_tokens).is_empty());
            }
        }
    }

    #[test]
    fn chunk_indices_follow_document_order() {
        let chunks = build("a. b. c. d. e. f. g", 4);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }
}
