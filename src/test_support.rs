//! In-process fakes of the remote APIs, served by axum on an ephemeral port so
//! the real reqwest paths run in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};

use crate::config::WikiConfig;
use crate::wiki::WikiClient;

// ── Fake encyclopedia ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FakePage {
    categories: Vec<String>,
    content: Option<String>,
}

impl FakePage {
    pub fn new(categories: &[&str], content: Option<&str>) -> Self {
        Self {
            categories: categories.iter().map(|c| c.to_string()).collect(),
            content: content.map(str::to_string),
        }
    }
}

/// Unregistered titles behave like the live service would for the page
/// lookup (a "missing" page) and fail with 500 for extracts, so a failing
/// final fetch can be simulated. Without `with_search` the search call fails.
#[derive(Debug, Default)]
pub struct FakeWiki {
    search: Option<Vec<String>>,
    pages: HashMap<String, FakePage>,
    extracts: HashMap<String, Option<String>>,
}

impl FakeWiki {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, titles: &[&str]) -> Self {
        self.search = Some(titles.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_page(mut self, title: &str, page: FakePage) -> Self {
        self.pages.insert(title.to_string(), page);
        self
    }

    pub fn with_extract(mut self, title: &str, extract: Option<&str>) -> Self {
        self.extracts
            .insert(title.to_string(), extract.map(str::to_string));
        self
    }

    pub async fn spawn(self) -> RunningWiki {
        let state = Arc::new(WikiState {
            wiki: self,
            last_params: Mutex::new(HashMap::new()),
            classified: Mutex::new(Vec::new()),
            user_agents: Mutex::new(Vec::new()),
            extract_calls: AtomicUsize::new(0),
        });
        let app = Router::new()
            .route("/w/api.php", get(wiki_api))
            .with_state(state.clone());
        let base = serve(app).await;
        RunningWiki {
            endpoint: format!("{}/w/api.php", base),
            state,
        }
    }
}

struct WikiState {
    wiki: FakeWiki,
    last_params: Mutex<HashMap<String, String>>,
    classified: Mutex<Vec<String>>,
    user_agents: Mutex<Vec<String>>,
    extract_calls: AtomicUsize,
}

pub struct RunningWiki {
    endpoint: String,
    state: Arc<WikiState>,
}

impl RunningWiki {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn client(&self) -> WikiClient {
        let config = WikiConfig::default()
            .with_endpoint(&self.endpoint)
            .unwrap();
        WikiClient::new(config).unwrap()
    }

    pub fn last_param(&self, key: &str) -> Option<String> {
        self.state.last_params.lock().unwrap().get(key).cloned()
    }

    /// Titles whose categories were requested, in request order.
    pub fn classified(&self) -> Vec<String> {
        self.state.classified.lock().unwrap().clone()
    }

    /// User-Agent of every request received, in order.
    pub fn user_agents(&self) -> Vec<String> {
        self.state.user_agents.lock().unwrap().clone()
    }

    pub fn extract_calls(&self) -> usize {
        self.state.extract_calls.load(Ordering::SeqCst)
    }
}

async fn wiki_api(
    State(state): State<Arc<WikiState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.user_agents.lock().unwrap().push(agent);
    *state.last_params.lock().unwrap() = params.clone();
    let title = params.get("titles").cloned().unwrap_or_default();

    if params.get("list").map(String::as_str) == Some("search") {
        return match &state.wiki.search {
            Some(titles) => {
                let hits: Vec<Value> = titles
                    .iter()
                    .map(|t| {
                        json!({
                            "ns": 0,
                            "title": t,
                            "snippet": format!("About <span class=\"searchmatch\">{}</span> here", t),
                        })
                    })
                    .collect();
                (StatusCode::OK, Json(json!({"query": {"search": hits}})))
            }
            None => server_error(),
        };
    }

    match params.get("prop").map(String::as_str) {
        Some("categories|revisions") => {
            state.classified.lock().unwrap().push(title.clone());
            let page = match state.wiki.pages.get(&title) {
                Some(page) => {
                    let mut body = Map::new();
                    body.insert("title".into(), json!(title));
                    if !page.categories.is_empty() {
                        let cats: Vec<Value> = page
                            .categories
                            .iter()
                            .map(|c| json!({"ns": 14, "title": c}))
                            .collect();
                        body.insert("categories".into(), Value::Array(cats));
                    }
                    if let Some(content) = &page.content {
                        body.insert("revisions".into(), json!([{ "*": content }]));
                    }
                    Value::Object(body)
                }
                None => json!({"ns": 0, "title": title, "missing": ""}),
            };
            (StatusCode::OK, Json(json!({"query": {"pages": {"736": page}}})))
        }
        Some("extracts") => {
            state.extract_calls.fetch_add(1, Ordering::SeqCst);
            match state.wiki.extracts.get(&title) {
                Some(Some(text)) => (
                    StatusCode::OK,
                    Json(json!({"query": {"pages": {"736": {"title": title, "extract": text}}}})),
                ),
                Some(None) => (
                    StatusCode::OK,
                    Json(json!({"query": {"pages": {"736": {"title": title}}}})),
                ),
                None => server_error(),
            }
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": "badparams"}})),
        ),
    }
}

fn server_error() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": {"code": "internal_api_error"}})),
    )
}

// ── Fake chat-completion API ─────────────────────────────────────────────────

struct CompletionState {
    status: StatusCode,
    reply: Value,
    seen: Mutex<Option<(Value, Option<String>)>>,
}

pub struct RunningCompletions {
    api_base: String,
    state: Arc<CompletionState>,
}

impl RunningCompletions {
    /// Serves `reply` with `status` at `{api_base}/chat/completions`.
    pub async fn spawn(status: StatusCode, reply: Value) -> Self {
        let state = Arc::new(CompletionState {
            status,
            reply,
            seen: Mutex::new(None),
        });
        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(state.clone());
        let base = serve(app).await;
        Self {
            api_base: format!("{}/v1", base),
            state,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Last request body and Authorization header.
    pub fn seen(&self) -> Option<(Value, Option<String>)> {
        self.state.seen.lock().unwrap().clone()
    }
}

async fn chat_completions(
    State(state): State<Arc<CompletionState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *state.seen.lock().unwrap() = Some((body, auth));
    (state.status, Json(state.reply.clone()))
}

// ── Shared ───────────────────────────────────────────────────────────────────

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
