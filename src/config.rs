use std::time::Duration;

use url::Url;

// ── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_USER_AGENT: &str = "MoviePlotFetcher/1.0";
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

const ENV_ENDPOINT: &str = "MOVIE_PLOT_API_URL";
const ENV_USER_AGENT: &str = "MOVIE_PLOT_USER_AGENT";
const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_API_BASE: &str = "OPENAI_API_BASE";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid endpoint {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("missing API key (set OPENAI_API_KEY or pass --api-key)")]
    MissingApiKey,
}

// ── Encyclopedia client configuration ────────────────────────────────────────

/// Fixed settings shared by every request the wiki client issues.
#[derive(Debug, Clone)]
pub struct WikiConfig {
    pub endpoint: Url,
    pub user_agent: String,
    pub search_limit: u32,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
        }
    }
}

impl WikiConfig {
    /// Defaults overlaid with `MOVIE_PLOT_API_URL` / `MOVIE_PLOT_USER_AGENT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(endpoint) = non_empty_var(ENV_ENDPOINT) {
            config.endpoint = parse_endpoint(&endpoint)?;
        }
        if let Some(agent) = non_empty_var(ENV_USER_AGENT) {
            config.user_agent = agent;
        }
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, ConfigError> {
        self.endpoint = parse_endpoint(endpoint)?;
        Ok(self)
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

// ── Review generator configuration ───────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReviewConfig {
    pub api_key: String,
    pub api_base: Url,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl ReviewConfig {
    pub fn new(api_key: impl Into<String>, api_base: &str) -> Result<Self, ConfigError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self {
            api_key,
            api_base: parse_endpoint(api_base)?,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(120),
        })
    }

    /// Reads `OPENAI_API_KEY` and `OPENAI_API_BASE` once. Explicit arguments
    /// take precedence over the environment.
    pub fn from_env(
        api_key: Option<String>,
        api_base: Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key
            .or_else(|| non_empty_var(ENV_API_KEY))
            .ok_or(ConfigError::MissingApiKey)?;
        let api_base = api_base
            .or_else(|| non_empty_var(ENV_API_BASE))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self::new(api_key, &api_base)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEndpoint {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEndpoint {
            url: raw.to_string(),
            reason: "only http and https endpoints are supported".to_string(),
        });
    }
    Ok(url)
}
