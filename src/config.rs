//! Assistant configuration
//!
//! All settings come from the process environment (optionally seeded from a
//! `.env` file by the binaries) and are passed explicitly into each component.

use crate::error::{AssistantError, Result};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
pub const DEFAULT_DATABASE: &str = "my_data.db";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:7861";

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    /// Credential for the inference service. Not validated.
    pub api_key: String,

    /// Base URL of an OpenAI-compatible chat-completions API
    pub base_url: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Pre-existing SQLite database file
    pub database_path: PathBuf,

    /// Address the form server binds to
    pub listen_addr: String,

    /// Sampling temperature for SQL generation
    pub sql_temperature: f32,

    /// Sampling temperature for the natural-language answer
    pub answer_temperature: f32,

    /// Language the answer should be written in (None = language of the question)
    pub answer_language: Option<String>,

    /// Only allow a single read-only query statement
    pub read_only: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            sql_temperature: 0.0,
            answer_temperature: 0.7,
            answer_language: None,
            read_only: false,
        }
    }
}

impl AssistantConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        match get("GROQ_API_KEY") {
            Some(key) => config.api_key = key,
            None => warn!("GROQ_API_KEY is not set - inference calls will fail to authenticate"),
        }
        if let Some(url) = get("LLM_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("LLM_MODEL") {
            config.model = model;
        }
        if let Some(path) = get("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(addr) = get("ASSISTANT_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(value) = get("SQL_TEMPERATURE") {
            config.sql_temperature = parse_temperature("SQL_TEMPERATURE", &value)?;
        }
        if let Some(value) = get("ANSWER_TEMPERATURE") {
            config.answer_temperature = parse_temperature("ANSWER_TEMPERATURE", &value)?;
        }
        config.answer_language = get("ANSWER_LANGUAGE");
        if let Some(value) = get("ASSISTANT_READ_ONLY") {
            config.read_only = parse_bool("ASSISTANT_READ_ONLY", &value)?;
        }

        Ok(config)
    }
}

fn parse_temperature(key: &str, value: &str) -> Result<f32> {
    let parsed: f32 = value.trim().parse().map_err(|_| {
        AssistantError::Config(format!("{} must be a number, got '{}'", key, value))
    })?;
    if !(0.0..=2.0).contains(&parsed) {
        return Err(AssistantError::Config(format!(
            "{} must be between 0 and 2, got {}",
            key, parsed
        )));
    }
    Ok(parsed)
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AssistantError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
