//! Sentence segmentation ahead of chunk packing.

/// Splits a document into ordered sentence-like spans.
///
/// Joining the spans with [`separator`](Self::separator) must reproduce the
/// document's content. [`terminator`](Self::terminator) is what a span lost
/// to the split and is restored when a span ends a chunk mid-document.
pub trait SentenceSplitter {
    fn split(&self, text: &str) -> Vec<String>;

    fn separator(&self) -> &str;

    fn terminator(&self) -> &str;
}

/// Splits on the literal `". "` after folding newlines into spaces.
///
/// A heuristic, not a linguistic parser: abbreviations such as "U.S. " also
/// end a span.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodSplitter;

impl SentenceSplitter for PeriodSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        let normalized = text.replace("\r\n", " ").replace('\n', " ");
        let sentences: Vec<String> = normalized
            .split(". ")
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .collect();

        if sentences.is_empty() {
            vec![normalized]
        } else {
            sentences
        }
    }

    fn separator(&self) -> &str {
        ". "
    }

    fn terminator(&self) -> &str {
        "."
    }
}
