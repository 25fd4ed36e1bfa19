use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_GOOGLE_TRANSLATE_API_URL: &str =
    "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Clone)]
pub struct Config {
    // Chat partner (OpenAI). A missing key is reported per request, not at startup.
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,

    // Translation backends, tried in order
    pub google_translate_api_key: Option<String>,
    pub google_translate_api_url: String,
    pub libretranslate_url: Option<String>,
    pub libretranslate_api_key: Option<String>,
    pub translate_timeout: Duration,

    // Login sessions
    pub session_ttl: Duration,
    pub max_sessions: usize,

    // Server
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // OpenAI
            openai_api_key: env_non_empty("OPENAI_API_KEY"),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_API_URL.to_string()),

            // Translation
            google_translate_api_key: env_non_empty("GOOGLE_TRANSLATE_API_KEY"),
            google_translate_api_url: std::env::var("GOOGLE_TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_GOOGLE_TRANSLATE_API_URL.to_string()),
            libretranslate_url: env_non_empty("LIBRETRANSLATE_URL"),
            libretranslate_api_key: env_non_empty("LIBRETRANSLATE_API_KEY"),
            translate_timeout: Duration::from_secs(
                std::env::var("TRANSLATE_TIMEOUT_SECS")
                    .ok()
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("TRANSLATE_TIMEOUT_SECS must be a whole number of seconds")?
                    .unwrap_or(5),
            ),

            // Sessions
            session_ttl: Duration::from_secs(
                std::env::var("SESSION_TTL_HOURS")
                    .ok()
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("SESSION_TTL_HOURS must be a whole number of hours")?
                    .unwrap_or(24)
                    * 3600,
            ),
            max_sessions: std::env::var("MAX_SESSIONS")
                .ok()
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_SESSIONS must be a whole number")?
                .unwrap_or(10_000),

            // Server
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("PORT must be a valid port number")?
                .unwrap_or(3000),
        })
    }

    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

/// Read an env var, treating blank values as unset.
fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
