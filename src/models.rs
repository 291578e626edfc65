use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

// ── Request-scoped entities ──────────────────────────────────────────────────

/// One ranked hit from the full-text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    /// Search snippet with highlight markup removed.
    pub snippet: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PageClassification {
    pub title: String,
    pub categories: BTreeSet<String>,
    pub raw_content: String,
    pub is_film: bool,
}

#[derive(Debug, Clone)]
pub struct ArticleText {
    pub full_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSummary {
    pub overview: String,
    pub plot: String,
}

// ── HTTP API bodies ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlotRequest {
    pub movie: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlotResponse {
    pub movie: String,
    pub result: String,
    pub found: bool,
}

// ── Remote API wire shapes ───────────────────────────────────────────────────
//
// Every field is optional so a partial body decodes and the caller decides
// which absence is fatal.

#[derive(Debug, Deserialize)]
pub(crate) struct SearchEnvelope {
    pub query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    pub search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    pub title: String,
    pub snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PagesEnvelope {
    pub query: Option<PagesQuery>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PagesQuery {
    pub pages: Option<HashMap<String, WirePage>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePage {
    pub categories: Option<Vec<WireCategory>>,
    pub revisions: Option<Vec<WireRevision>>,
    pub extract: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireCategory {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireRevision {
    #[serde(rename = "*")]
    pub content: Option<String>,
}

impl PagesEnvelope {
    /// The single page of a `titles=` query, whatever its page id key is.
    pub(crate) fn into_first_page(self) -> Option<WirePage> {
        self.query?.pages?.into_values().next()
    }
}
