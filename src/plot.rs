use std::fmt;

use tracing::{debug, error, info, warn};

use crate::extract;
use crate::models::ExtractedSummary;
use crate::wiki::{Classification, WikiClient};

pub const MOVIE_NOT_FOUND: &str = "Movie not found.";
pub const FETCH_FAILED: &str = "Error fetching plot.";

/// Terminal state of one lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotOutcome {
    Found {
        title: String,
        summary: ExtractedSummary,
    },
    NotFound,
    FetchFailed,
}

impl PlotOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, PlotOutcome::Found { .. })
    }
}

impl fmt::Display for PlotOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotOutcome::Found { summary, .. } => f.write_str(&extract::format_summary(summary)),
            PlotOutcome::NotFound => f.write_str(MOVIE_NOT_FOUND),
            PlotOutcome::FetchFailed => f.write_str(FETCH_FAILED),
        }
    }
}

/// Search, pick the first candidate that looks like a film article, then
/// summarize its plain-text extract. Strictly sequential; at most one extract
/// is fetched.
pub async fn find_movie_plot(client: &WikiClient, movie_name: &str) -> PlotOutcome {
    let candidates = match client.search(movie_name).await {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(movie = movie_name, error = %e, "search failed");
            Vec::new()
        }
    };

    for candidate in &candidates {
        let classification = client.classify(&candidate.title).await;
        match &classification {
            Classification::Classified(page) => debug!(
                title = %page.title,
                categories = page.categories.len(),
                content_len = page.raw_content.len(),
                is_film = page.is_film,
                "classified candidate"
            ),
            Classification::LookupFailed(e) => {
                warn!(title = %candidate.title, error = %e, "page lookup failed, skipping");
            }
        }
        if classification.is_film() {
            info!(movie = movie_name, title = %candidate.title, "selected film article");
            return fetch_summary(client, &candidate.title).await;
        }
    }

    info!(
        movie = movie_name,
        candidates = candidates.len(),
        "no film article among candidates"
    );
    PlotOutcome::NotFound
}

async fn fetch_summary(client: &WikiClient, title: &str) -> PlotOutcome {
    match client.fetch_extract(title).await {
        Ok(article) => PlotOutcome::Found {
            title: title.to_string(),
            summary: extract::summarize(&article.full_text),
        },
        Err(e) => {
            error!(title, error = %e, "failed to fetch plot extract");
            PlotOutcome::FetchFailed
        }
    }
}

/// Entry point: the summary text or one of the two sentinel strings.
pub async fn get_movie_plot(client: &WikiClient, movie_name: &str) -> String {
    find_movie_plot(client, movie_name).await.to_string()
}
