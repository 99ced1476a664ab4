//! Server configuration from the process environment.

use std::env;
use std::str::FromStr;

use journal_types::{JournalError, Result, config::AssistantConfig};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub assistant: AssistantConfig,
    /// Hard limit on one `/api/newAI` request, platform calls included.
    /// Defaults to the polling budget.
    pub request_timeout_ms: u64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = AssistantConfig::default();

        let api_key = lookup("OPEN_AI_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| JournalError::Config("OPEN_AI_KEY is not set".to_string()))?;
        let assistant_id = lookup("ASSISTANT_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| JournalError::Config("ASSISTANT_ID is not set".to_string()))?;

        let assistant = AssistantConfig {
            assistant_id,
            api_key,
            api_base: lookup("OPENAI_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            poll_interval_ms: parse_or(&lookup, "POLL_INTERVAL_MS", defaults.poll_interval_ms)?,
            max_poll_attempts: parse_or(&lookup, "MAX_POLL_ATTEMPTS", defaults.max_poll_attempts)?,
            max_duration_ms: parse_or(&lookup, "MAX_DURATION_MS", defaults.max_duration_ms)?,
        };
        if assistant.max_poll_attempts == 0 {
            return Err(JournalError::Config("MAX_POLL_ATTEMPTS must be at least 1".to_string()));
        }

        let request_timeout_ms = parse_or(
            &lookup,
            "REQUEST_TIMEOUT_MS",
            assistant.max_duration_ms,
        )?;

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            assistant,
            request_timeout_ms,
        })
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| JournalError::Config(format!("{} has an invalid value: {}", key, raw))),
    }
}
