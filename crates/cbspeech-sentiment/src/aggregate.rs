//! Reduction of per-chunk distributions to one verdict.

use crate::types::{Label, LabelDistribution, SentimentVerdict};

/// Combine per-chunk distributions into a document verdict.
///
/// Each label's score is the mean over the distributions that reported it;
/// a label nobody reported scores 0.0. The highest mean wins, ties going to
/// the earlier label in [`Label::ALL`]. Scores are averaged probabilities and
/// are not renormalized.
///
/// Empty input, or input where no distribution carries any label, yields
/// [`SentimentVerdict::neutral`]. `chunk_count` is always `distributions.len()`.
///
/// The result does not depend on the order of `distributions`.
#[must_use]
pub fn aggregate(distributions: &[LabelDistribution]) -> SentimentVerdict {
    let classified_chunks = distributions.iter().filter(|d| !d.is_empty()).count();
    if classified_chunks == 0 {
        return SentimentVerdict::neutral(distributions.len());
    }

    let means = Label::ALL.map(|label| mean_for(distributions, label));

    let mut winner = 0;
    for (i, mean) in means.iter().enumerate().skip(1) {
        if *mean > means[winner] {
            winner = i;
        }
    }

    SentimentVerdict {
        label: Label::ALL[winner],
        score: means[winner],
        positive: means[0],
        negative: means[1],
        neutral: means[2],
        chunk_count: distributions.len(),
        classified_chunks,
    }
}

fn mean_for(distributions: &[LabelDistribution], label: Label) -> f64 {
    let mut scores: Vec<f64> = distributions.iter().filter_map(|d| d.get(label)).collect();
    if scores.is_empty() {
        return 0.0;
    }

    // Summed in sorted order so the result is bit-identical for any input order.
    scores.sort_by(f64::total_cmp);

    #[allow(clippy::cast_precision_loss)]
    let denom = scores.len() as f64;
    scores.iter().sum::<f64>() / denom
}
