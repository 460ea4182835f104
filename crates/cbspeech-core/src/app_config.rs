use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Only commands that touch storage require this.
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    pub tei_url: String,
    pub tokenizer_path: PathBuf,
    /// Identifier stored alongside each verdict; one speech may carry
    /// verdicts from several models.
    pub model_name: String,
    pub model_token_limit: usize,
    pub reserved_tokens: usize,
    pub fallback_prefix_length: usize,
    pub classifier_timeout_secs: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Return the database URL for commands that need storage.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if `DATABASE_URL` was not set.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("tei_url", &self.tei_url)
            .field("tokenizer_path", &self.tokenizer_path)
            .field("model_name", &self.model_name)
            .field("model_token_limit", &self.model_token_limit)
            .field("reserved_tokens", &self.reserved_tokens)
            .field("fallback_prefix_length", &self.fallback_prefix_length)
            .field("classifier_timeout_secs", &self.classifier_timeout_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
