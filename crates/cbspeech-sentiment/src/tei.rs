//! TEI (Text Embeddings Inference) client for sequence classification.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::ChunkClassifier;
use crate::error::SentimentError;
use crate::types::LabelDistribution;

/// Longest error body echoed back in [`SentimentError::Tei`].
const MAX_ERROR_BODY: usize = 300;

/// Classifier served by a TEI instance, e.g. `ProsusAI/finbert`.
pub struct TeiClassifier {
    client: reqwest::Client,
    base_url: String,
    model_token_limit: Option<usize>,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: &'a str,
    raw_scores: bool,
    /// Over-long input must fail rather than be cut short.
    truncate: bool,
}

#[derive(Deserialize)]
struct PredictItem {
    label: String,
    score: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PredictResponse {
    Single(Vec<PredictItem>),
    Batch(Vec<Vec<PredictItem>>),
}

#[derive(Deserialize)]
struct InfoResponse {
    model_id: String,
    #[serde(default)]
    max_input_length: Option<usize>,
    model_type: serde_json::Value,
}

impl TeiClassifier {
    /// Create a client for the TEI server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, SentimentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("cbspeech/0.1 (sentiment-analysis)")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_token_limit: None,
        })
    }

    /// Token limit the engine budgets for; checked against the server on load.
    #[must_use]
    pub fn with_model_token_limit(mut self, limit: usize) -> Self {
        self.model_token_limit = Some(limit);
        self
    }

    async fn error_from(response: reqwest::Response, what: &str) -> SentimentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY).collect();
        SentimentError::Tei(format!("{what} returned status {status}: {body}"))
    }
}

impl ChunkClassifier for TeiClassifier {
    /// Verify the server hosts a sequence classifier.
    async fn load(&self) -> Result<(), SentimentError> {
        let url = format!("{}/info", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SentimentError::Tei(format!("TEI info request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "TEI info").await);
        }

        let info: InfoResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Tei(format!("TEI info parse error: {e}")))?;

        if info.model_type.get("classifier").is_none() {
            return Err(SentimentError::Tei(format!(
                "model {} is not a sequence classifier",
                info.model_id
            )));
        }

        if let (Some(server), Some(configured)) = (info.max_input_length, self.model_token_limit) {
            if server < configured {
                tracing::warn!(
                    model = %info.model_id,
                    server_max_input_length = server,
                    configured_token_limit = configured,
                    "TEI accepts fewer tokens than configured; chunks may be rejected"
                );
            }
        }

        tracing::info!(
            model = %info.model_id,
            max_input_length = ?info.max_input_length,
            "TEI classifier ready"
        );
        Ok(())
    }

    async fn classify(&self, text: &str) -> Result<LabelDistribution, SentimentError> {
        let url = format!("{}/predict", self.base_url);
        let request = PredictRequest {
            inputs: text,
            raw_scores: false,
            truncate: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SentimentError::Tei(format!("TEI predict request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "TEI predict").await);
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Tei(format!("TEI predict parse error: {e}")))?;

        let items = match parsed {
            PredictResponse::Single(items) => items,
            PredictResponse::Batch(mut batches) => {
                if batches.is_empty() {
                    Vec::new()
                } else {
                    batches.swap_remove(0)
                }
            }
        };

        let dist =
            LabelDistribution::from_pairs(items.iter().map(|i| (i.label.as_str(), i.score)));
        if dist.is_empty() {
            return Err(SentimentError::Tei(
                "TEI predict returned no known sentiment labels".to_string(),
            ));
        }
        Ok(dist)
    }
}
