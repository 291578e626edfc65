use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::WikiConfig;
use crate::extract::{self, looks_like_film};
use crate::models::{
    ArticleText, PageClassification, PagesEnvelope, SearchEnvelope, SearchResult,
};

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    #[error("{0}")]
    Request(String),
    #[error("upstream returned {0}")]
    Upstream(StatusCode),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("response is missing {0}")]
    MissingField(&'static str),
}

/// Outcome of checking one search candidate.
#[derive(Debug)]
pub enum Classification {
    Classified(PageClassification),
    LookupFailed(WikiError),
}

impl Classification {
    pub fn is_film(&self) -> bool {
        matches!(self, Classification::Classified(page) if page.is_film)
    }
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Encyclopedia API client. Holds the endpoint and identifying header; every
/// operation builds its own query parameters.
#[derive(Debug, Clone)]
pub struct WikiClient {
    http: reqwest::Client,
    config: WikiConfig,
}

impl WikiClient {
    pub fn new(config: WikiConfig) -> Result<Self, WikiError> {
        let http = reqwest::ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| WikiError::Request(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    /// Up to `search_limit` titles in the service's ranking order.
    #[instrument(level = "debug", skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<SearchResult>, WikiError> {
        let limit = self.config.search_limit.to_string();
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("list", "search"),
            ("srsearch", term),
            ("utf8", "1"),
            ("srlimit", limit.as_str()),
        ];
        let envelope: SearchEnvelope = self.get_json(&params).await?;
        let query = envelope.query.ok_or(WikiError::MissingField("query"))?;

        let results: Vec<SearchResult> = query
            .search
            .into_iter()
            .map(|hit| SearchResult {
                title: hit.title,
                snippet: hit.snippet.as_deref().map(extract::snippet_text),
            })
            .collect();
        debug!(count = results.len(), "search returned candidates");
        Ok(results)
    }

    /// Fetches categories and the latest wikitext revision in one request and
    /// applies the film heuristic. Never errors: failures become
    /// [`Classification::LookupFailed`].
    #[instrument(level = "debug", skip(self))]
    pub async fn classify(&self, title: &str) -> Classification {
        match self.lookup_page(title).await {
            Ok(page) => Classification::Classified(page),
            Err(e) => Classification::LookupFailed(e),
        }
    }

    async fn lookup_page(&self, title: &str) -> Result<PageClassification, WikiError> {
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("titles", title),
            ("prop", "categories|revisions"),
            ("rvprop", "content"),
            ("cllimit", "max"),
        ];
        let envelope: PagesEnvelope = self.get_json(&params).await?;
        let page = envelope
            .into_first_page()
            .ok_or(WikiError::MissingField("query.pages"))?;

        let categories: Vec<String> = page
            .categories
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.title)
            .collect();
        let raw_content = page
            .revisions
            .and_then(|revs| revs.into_iter().next())
            .and_then(|rev| rev.content);

        let is_film = looks_like_film(
            categories.iter().map(String::as_str),
            raw_content.as_deref(),
        );
        // Without a category hit the revision body is required.
        if !is_film && raw_content.is_none() {
            return Err(WikiError::MissingField("revisions[0].*"));
        }

        Ok(PageClassification {
            title: title.to_string(),
            categories: categories.into_iter().collect(),
            raw_content: raw_content.unwrap_or_default(),
            is_film,
        })
    }

    /// Plain-text rendering of one article.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_extract(&self, title: &str) -> Result<ArticleText, WikiError> {
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("titles", title),
            ("prop", "extracts"),
            ("explaintext", "true"),
        ];
        let envelope: PagesEnvelope = self.get_json(&params).await?;
        let full_text = envelope
            .into_first_page()
            .ok_or(WikiError::MissingField("query.pages"))?
            .extract
            .ok_or(WikiError::MissingField("extract"))?;
        Ok(ArticleText { full_text })
    }

    async fn get_json<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, WikiError> {
        debug!(endpoint = %self.config.endpoint, ?params, "wiki request");

        let response = self
            .http
            .get(self.config.endpoint.clone())
            .query(params)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WikiError::Upstream(status));
        }

        let body = response
            .text()
            .await
            .map_err(request_error)?;
        serde_json::from_str(&body).map_err(|e| WikiError::Decode(e.to_string()))
    }
}

fn request_error(e: reqwest::Error) -> WikiError {
    if e.is_timeout() {
        WikiError::Request(format!("TimeoutError: {}", e))
    } else if e.is_connect() {
        WikiError::Request(format!("ConnectError: {}", e))
    } else {
        WikiError::Request(format!("RequestError: {}", e))
    }
}
