use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = lookup("DATABASE_URL").ok().filter(|u| !u.trim().is_empty());
    let env = parse_environment(&or_default("CBSPEECH_ENV", "development"))?;
    let log_level = or_default("CBSPEECH_LOG_LEVEL", "info");

    let tei_url = or_default("CBSPEECH_TEI_URL", "http://localhost:8080")
        .trim_end_matches('/')
        .to_string();
    let tokenizer_path = PathBuf::from(or_default(
        "CBSPEECH_TOKENIZER_PATH",
        "./models/finbert/tokenizer.json",
    ));
    let model_name = or_default("CBSPEECH_MODEL_NAME", "finbert");
    if model_name.trim().is_empty() {
        return Err(invalid("CBSPEECH_MODEL_NAME", "must not be empty".to_string()));
    }

    let model_token_limit = parse_usize("CBSPEECH_MODEL_TOKEN_LIMIT", "512")?;
    let reserved_tokens = parse_usize("CBSPEECH_RESERVED_TOKENS", "2")?;
    if model_token_limit <= reserved_tokens {
        return Err(invalid(
            "CBSPEECH_MODEL_TOKEN_LIMIT",
            format!("must exceed CBSPEECH_RESERVED_TOKENS ({reserved_tokens})"),
        ));
    }
    let fallback_prefix_length = parse_usize("CBSPEECH_FALLBACK_PREFIX_LENGTH", "2000")?;
    let classifier_timeout_secs = parse_u64("CBSPEECH_CLASSIFIER_TIMEOUT_SECS", "30")?;

    let db_max_connections = parse_u32("CBSPEECH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("CBSPEECH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CBSPEECH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        tei_url,
        tokenizer_path,
        model_name,
        model_token_limit,
        reserved_tokens,
        fallback_prefix_length,
        classifier_timeout_secs,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CBSPEECH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
