//! Synthetic product-review generator backed by an OpenAI-compatible
//! chat-completion endpoint.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ReviewConfig;

pub const DEFAULT_NUM_REVIEWS: u32 = 10;

const REVIEW_TEMPLATE: &str = "
generate csv formatted reviews for two different imaginary TVs. come up with a name for each one.
for each tv, generate {num_reviews} reviews, with random number of positive and negatives reviews.
each review will have these fields in the csv: tv name, review title, review rating (1-10), review text
be creative in your reviews, amaze us, csv format is a must.
";

static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[A-Za-z]*[ \t]*\n(.*?)\n?```\s*$").unwrap());

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("{0}")]
    Request(String),
    #[error("completion endpoint returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },
    #[error("malformed completion response: {0}")]
    Decode(String),
    #[error("completion contained no text")]
    Empty,
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

// ── Public API ───────────────────────────────────────────────────────────────

pub fn review_prompt(num_reviews: u32) -> String {
    REVIEW_TEMPLATE.replace("{num_reviews}", &num_reviews.to_string())
}

/// Drops a surrounding Markdown code fence (```csv ... ```), if any.
pub fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE_RE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text.trim(),
    }
}

#[derive(Debug, Clone)]
pub struct ReviewGenerator {
    http: reqwest::Client,
    config: ReviewConfig,
}

impl ReviewGenerator {
    pub fn new(config: ReviewConfig) -> Result<Self, ReviewError> {
        let http = reqwest::ClientBuilder::new()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReviewError::Request(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// CSV rows for two imaginary TVs, `num_reviews` reviews each.
    pub async fn generate(&self, num_reviews: u32) -> Result<String, ReviewError> {
        let prompt = review_prompt(num_reviews);
        let completion = self.complete(&prompt).await?;
        Ok(strip_code_fence(&completion).to_string())
    }

    async fn complete(&self, prompt: &str) -> Result<String, ReviewError> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.as_str().trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        info!(model = %self.config.model, "requesting completion");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReviewError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReviewError::Upstream { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReviewError::Decode(e.to_string()))?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ReviewError::Empty)?;
        debug!(chars = text.len(), "completion received");
        Ok(text)
    }
}
