use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::models::ExtractedSummary;

// ── Constants ────────────────────────────────────────────────────────────────

const PARAGRAPH_BREAK: &str = "\n\n";
const PLOT_HEADING: &str = "== Plot ==";
const SECTION_MARKER: &str = "==";
const FILM_CATEGORY_NEEDLE: &str = "films";
const FILM_INFOBOX_MARKER: &str = "{{Infobox film";

pub const PLOT_NOT_FOUND: &str = "Plot section not found in the text.";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ── Classification heuristic ─────────────────────────────────────────────────

/// Either a category naming "films" (any case) or a film infobox in the raw
/// wikitext is enough. The two signals are never cross-checked.
pub fn looks_like_film<'a>(
    categories: impl IntoIterator<Item = &'a str>,
    raw_content: Option<&str>,
) -> bool {
    categories
        .into_iter()
        .any(|c| c.to_lowercase().contains(FILM_CATEGORY_NEEDLE))
        || raw_content.is_some_and(|c| c.contains(FILM_INFOBOX_MARKER))
}

// ── Text extractors ──────────────────────────────────────────────────────────

/// Text before the first blank line, trimmed. The whole text when there is
/// no blank line.
pub fn first_paragraph(full_text: &str) -> &str {
    match full_text.find(PARAGRAPH_BREAK) {
        Some(end) => full_text[..end].trim(),
        None => full_text.trim(),
    }
}

/// Body of the "== Plot ==" section, up to the next "==" marker or the end of
/// the text.
pub fn plot_section(full_text: &str) -> &str {
    let Some(heading) = full_text.find(PLOT_HEADING) else {
        return PLOT_NOT_FOUND;
    };
    let start = heading + PLOT_HEADING.len();
    let end = full_text[start..]
        .find(SECTION_MARKER)
        .map_or(full_text.len(), |offset| start + offset);
    full_text[start..end].trim()
}

pub fn summarize(full_text: &str) -> ExtractedSummary {
    ExtractedSummary {
        overview: first_paragraph(full_text).to_string(),
        plot: plot_section(full_text).to_string(),
    }
}

/// Renders the "Overview:" / "Plot:" block handed back to callers.
pub fn format_summary(summary: &ExtractedSummary) -> String {
    format!(
        "Overview:\n{}\nPlot:\n{}",
        summary.overview, summary.plot
    )
    .trim()
    .to_string()
}

// ── Search snippet cleanup ───────────────────────────────────────────────────

/// Search snippets come back as HTML fragments with `<span class="searchmatch">`
/// highlights. Keep the text only.
pub fn snippet_text(snippet: &str) -> String {
    let fragment = Html::parse_fragment(snippet);
    let text = collect_text(fragment.root_element());
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Recursively collect all text from an element and its descendants.
fn collect_text(el: ElementRef<'_>) -> String {
    use scraper::node::Node;
    let mut parts = Vec::new();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => parts.push((&*text.text).to_string()),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    parts.push(collect_text(child_el));
                }
            }
            _ => {}
        }
    }
    parts.join("")
}
