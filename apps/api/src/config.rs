use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Raw source store for the ETL rebuild. Only required when running
    /// the `etl` subcommand.
    pub source_database_url: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    /// Absent means no LLM: the planning endpoint uses the template report.
    pub llm_api_key: Option<String>,
    /// Path to a classifier tables JSON file; absent means built-in defaults.
    pub classifier_tables_path: Option<String>,
    pub etl_batch_size: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            source_database_url: optional_env("SOURCE_DATABASE_URL"),
            llm_base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            llm_model: std::env::var("LLM_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            llm_api_key: optional_env("LLM_API_KEY"),
            classifier_tables_path: optional_env("CLASSIFIER_TABLES"),
            etl_batch_size: std::env::var("ETL_BATCH_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse::<i64>()
                .context("ETL_BATCH_SIZE must be a positive integer")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
