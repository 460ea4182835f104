//! Shared configuration and domain types for the cbspeech workspace.

pub mod app_config;
pub mod config;
pub mod speeches;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use speeches::{NewSpeech, SpeechSource};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid speech source: {0}")]
    InvalidSource(String),
    #[error("required field is empty: {0}")]
    EmptyField(String),
}
