use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("TEI classifier error: {0}")]
    Tei(String),

    #[error("storage error: {0}")]
    Storage(String),
}
