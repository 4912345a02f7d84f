//! Web tool implementations
//!
//! - search_web: ordered provider list, first non-empty result wins
//! - fetch_page: GET a page and reduce it to collapsed plain text
//! - get_search_engine: report the primary provider
//!
//! The provider order depends only on whether a Brave key is configured.
//! Provider faults are logged and count as an empty result so the next
//! provider still gets its turn.

use crate::errors::{Result, ToolError};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com/html/";
pub const BRAVE_API_URL: &str = "https://api.search.brave.com/res/v1/web/search";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Upper bound for `max_results`
pub const MAX_SEARCH_RESULTS: u64 = 20;

const NO_RESULTS_MESSAGE: &str = "No results found or search service unavailable";
const TRUNCATION_MARKER: &str = "...";

/// Elements whose text never reaches the extracted page content
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Settings for the web backend
#[derive(Debug, Clone)]
pub struct WebOptions {
    pub duckduckgo_url: String,
    pub brave_url: String,
    pub brave_api_key: Option<String>,
    pub region: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub max_fetch_bytes: u64,
}

impl Default for WebOptions {
    fn default() -> Self {
        Self {
            duckduckgo_url: DUCKDUCKGO_URL.to_string(),
            brave_url: BRAVE_API_URL.to_string(),
            brave_api_key: None,
            region: "uk-en".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(10),
            max_fetch_bytes: 2_097_152, // 2MB
        }
    }
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Search providers known to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Brave,
    DuckDuckGo,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Brave => "brave",
            ProviderKind::DuckDuckGo => "duckduckgo",
        }
    }
}

/// Provider order for a given credential state
pub fn provider_policy(brave_key_set: bool) -> Vec<ProviderKind> {
    if brave_key_set {
        vec![ProviderKind::Brave, ProviderKind::DuckDuckGo]
    } else {
        vec![ProviderKind::DuckDuckGo]
    }
}

/// A search engine behind `search_web`
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>>;
}

/// Brave web search API
pub struct BraveSearch {
    client: Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveHit>,
}

#[derive(Debug, Deserialize)]
struct BraveHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

#[async_trait]
impl SearchProvider for BraveSearch {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Brave
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let count = max_results.to_string();
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body: BraveResponse = response.json().await?;
        let results = body
            .web
            .map(|web| web.results)
            .unwrap_or_default()
            .into_iter()
            .take(max_results)
            .map(|hit| SearchResult {
                title: hit.title,
                url: hit.url,
                snippet: hit.description,
            })
            .collect();

        Ok(results)
    }
}

/// DuckDuckGo HTML endpoint, scraped
pub struct DuckDuckGoSearch {
    client: Client,
    url: String,
    region: String,
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DuckDuckGo
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let html = self
            .client
            .get(&self.url)
            .query(&[("q", query), ("kl", self.region.as_str())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_duckduckgo(&html, max_results)
    }
}

/// Parse the DuckDuckGo HTML result page
pub fn parse_duckduckgo(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let body_sel = selector("div.result__body")?;
    let title_sel = selector(".result__title")?;
    let url_sel = selector(".result__url")?;
    let snippet_sel = selector(".result__snippet")?;

    let document = Html::parse_document(html);
    let results = document
        .select(&body_sel)
        .filter_map(|body| {
            let url = body.select(&url_sel).next().map(element_text)?;
            if url.is_empty() {
                return None;
            }

            let title = body
                .select(&title_sel)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "No title".to_string());
            let snippet = body
                .select(&snippet_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();

            Some(SearchResult {
                title,
                url,
                snippet,
            })
        })
        .take(max_results)
        .collect();

    Ok(results)
}

/// Web backend: HTTP client plus the ordered provider list
pub struct WebBackend {
    client: Client,
    providers: Vec<Arc<dyn SearchProvider>>,
    options: WebOptions,
}

impl WebBackend {
    pub fn new(options: WebOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .user_agent(options.user_agent.clone())
            .build()?;

        let providers = provider_policy(options.brave_api_key.is_some())
            .into_iter()
            .map(|kind| -> Arc<dyn SearchProvider> {
                match kind {
                    ProviderKind::Brave => Arc::new(BraveSearch {
                        client: client.clone(),
                        url: options.brave_url.clone(),
                        api_key: options.brave_api_key.clone().unwrap_or_default(),
                    }),
                    ProviderKind::DuckDuckGo => Arc::new(DuckDuckGoSearch {
                        client: client.clone(),
                        url: options.duckduckgo_url.clone(),
                        region: options.region.clone(),
                    }),
                }
            })
            .collect();

        Ok(Self {
            client,
            providers,
            options,
        })
    }

    /// Replace the provider list
    pub fn with_providers(mut self, providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        self.providers = providers;
        self
    }

    /// Search the web
    pub async fn search(&self, query: &str, max_results: u64) -> Result<Value> {
        if query.trim().is_empty() {
            return Err(ToolError::invalid("query cannot be empty"));
        }
        if !(1..=MAX_SEARCH_RESULTS).contains(&max_results) {
            return Err(ToolError::invalid(format!(
                "max_results must be between 1 and {}, got {}",
                MAX_SEARCH_RESULTS, max_results
            )));
        }

        for provider in &self.providers {
            let engine = provider.kind().as_str();
            match provider.search(query, max_results as usize).await {
                Ok(results) if !results.is_empty() => {
                    info!(engine, count = results.len(), "search succeeded");
                    return Ok(json!({ "engine": engine, "results": results }));
                }
                Ok(_) => debug!(engine, "search returned no results"),
                Err(e) => warn!(engine, error = %e, "search provider failed"),
            }
        }

        Ok(json!({ "results": [], "message": NO_RESULTS_MESSAGE }))
    }

    /// Fetch a page and extract its text
    pub async fn fetch_page(&self, url: &str, max_chars: u64) -> Result<Value> {
        let parsed = Url::parse(url)
            .map_err(|e| ToolError::invalid(format!("Invalid URL {}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ToolError::invalid(format!(
                "Unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }
        if max_chars == 0 {
            return Err(ToolError::invalid("max_chars must be at least 1"));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::backend(format!(
                "Failed to fetch {}: HTTP {}",
                url, status
            )));
        }

        let body = self.read_body(url, response).await?;
        let text = extract_text(&String::from_utf8_lossy(&body));
        let (content, truncated) = truncate_chars(&text, max_chars as usize);

        debug!(url, bytes = body.len(), chars = text.chars().count(), truncated, "page fetched");
        Ok(json!({ "url": url, "content": content, "truncated": truncated }))
    }

    /// Report the primary provider
    pub fn search_engine(&self) -> Value {
        let primary = provider_policy(self.options.brave_api_key.is_some())[0];
        json!({
            "engine": primary.as_str(),
            "brave_api_key_set": self.options.brave_api_key.is_some(),
        })
    }

    async fn read_body(&self, url: &str, mut response: Response) -> Result<Vec<u8>> {
        let limit = self.options.max_fetch_bytes;
        if let Some(declared) = response.content_length() {
            if declared > limit {
                return Err(ToolError::Overflow {
                    actual: declared,
                    limit,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.transport_error(url, e))?
        {
            let actual = (body.len() + chunk.len()) as u64;
            if actual > limit {
                return Err(ToolError::Overflow { actual, limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> ToolError {
        if err.is_timeout() {
            warn!(url, "request timed out");
            ToolError::TimedOut {
                limit_ms: self.options.request_timeout.as_millis() as u64,
            }
        } else {
            ToolError::backend(format!("Failed to fetch {}: {}", url, err))
        }
    }
}

/// Visible text of a document, whitespace collapsed
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut words: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            matches!(ancestor.value(), Node::Element(el) if HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}

/// Cut to `max_chars` characters, appending the marker when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => (format!("{}{}", &text[..end], TRUNCATION_MARKER), true),
        None => (text.to_string(), false),
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ToolError::backend(format!("Bad selector {}: {:?}", css, e)))
}
