use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::conversation::context::{DEFAULT_CONTEXT_WINDOW, MAX_CONTEXT_WINDOW};

/// Application configuration, built once at startup and passed by reference
/// into the pool and inference client constructors.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// How many prior messages the context builder may include in a prompt.
    pub context_window: usize,
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub base_url: String,
    /// Used when a tutor has no model id of its own.
    pub default_model: String,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let context_window: usize =
            parse_or(&lookup, "CONTEXT_WINDOW", DEFAULT_CONTEXT_WINDOW)?;
        if !(1..=MAX_CONTEXT_WINDOW).contains(&context_window) {
            anyhow::bail!("CONTEXT_WINDOW must be between 1 and {MAX_CONTEXT_WINDOW}");
        }

        Ok(Config {
            database_url: lookup("DATABASE_URL")
                .context("Required environment variable 'DATABASE_URL' is not set")?,
            port: parse_or(&lookup, "PORT", 8000)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            context_window,
            inference: InferenceConfig {
                base_url: lookup("INFERENCE_URL")
                    .unwrap_or_else(|| "http://localhost:8001".to_string()),
                default_model: lookup("INFERENCE_MODEL")
                    .unwrap_or_else(|| "qwen2.5-7b-instruct".to_string()),
                request_timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "INFERENCE_TIMEOUT_SECS",
                    60,
                )?),
                health_timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "INFERENCE_HEALTH_TIMEOUT_SECS",
                    5,
                )?),
                temperature: parse_or(&lookup, "INFERENCE_TEMPERATURE", 0.7)?,
                max_tokens: parse_or(&lookup, "INFERENCE_MAX_TOKENS", 1024)?,
                top_p: parse_or(&lookup, "INFERENCE_TOP_P", 0.95)?,
            },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}")),
    }
}
