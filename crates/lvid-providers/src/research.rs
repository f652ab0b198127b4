//! Best-effort research-context gathering for content generation.
//!
//! Before generating a script, the orchestrator can enrich the prompt with
//! (a) web-search results for the topic and (b) the text of up to three
//! caller-supplied URLs. Every failure in here is swallowed with a warning;
//! this step never fails the content stage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};

pub const SEARCH_PROVIDER: &str = "search";

/// Maximum caller-supplied URLs fetched per request.
const MAX_SOURCE_URLS: usize = 3;

/// Web search contract.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> ProviderResult<Vec<SearchResult>>;

    fn name(&self) -> &'static str {
        SEARCH_PROVIDER
    }
}

/// A single search result.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// Configuration for the HTTP search client.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub api_key: String,
    pub max_results: usize,
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key: String::new(),
            max_results: 5,
            timeout: Duration::from_secs(20),
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("SEARCH_API_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("SEARCH_API_KEY").unwrap_or_default(),
            max_results: std::env::var("SEARCH_MAX_RESULTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            timeout: Duration::from_secs(
                std::env::var("SEARCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(20),
            ),
        }
    }
}

/// HTTP implementation of [`WebSearch`].
pub struct HttpWebSearch {
    http: Client,
    config: SearchConfig,
}

#[derive(Debug, Serialize)]
struct SearchRequestBody<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    #[serde(default)]
    results: Vec<SearchResult>,
}

impl HttpWebSearch {
    pub fn new(config: SearchConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::fatal(format!("search client build failed: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(SearchConfig::from_env())
    }
}

#[async_trait]
impl WebSearch for HttpWebSearch {
    async fn search(&self, query: &str) -> ProviderResult<Vec<SearchResult>> {
        let url = format!("{}/search", self.config.base_url);

        let response = self
            .http
            .post(&url)
            .json(&SearchRequestBody {
                api_key: &self.config.api_key,
                query,
                max_results: self.config.max_results,
            })
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(SEARCH_PROVIDER, &e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(SEARCH_PROVIDER, status, &body));
        }

        let parsed: SearchResponseBody = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_output(format!("search response malformed: {e}")))?;

        Ok(parsed.results)
    }
}

/// Gathers research context from search results and reference URLs.
pub struct ResearchGatherer {
    search: Option<Arc<dyn WebSearch>>,
    http: Client,
    /// Character budget applied to each fetched source
    per_source_chars: usize,
}

impl ResearchGatherer {
    pub fn new(search: Option<Arc<dyn WebSearch>>, per_source_chars: usize) -> Self {
        Self {
            search,
            http: Client::new(),
            per_source_chars,
        }
    }

    /// Assemble a research context string, best-effort.
    ///
    /// Returns `None` when no source yields anything; the content stage then
    /// proceeds without enrichment.
    pub async fn gather(&self, topic: &str, urls: &[String]) -> Option<String> {
        let mut sections = Vec::new();

        if let Some(ref search) = self.search {
            match search.search(topic).await {
                Ok(results) if !results.is_empty() => {
                    sections.push(render_search_results(&results, self.per_source_chars));
                }
                Ok(_) => debug!(topic = %topic, "Web search returned no results"),
                Err(e) => warn!(topic = %topic, "Web search failed, skipping: {}", e),
            }
        }

        for url in urls.iter().take(MAX_SOURCE_URLS) {
            match self.fetch_url(url).await {
                Ok(text) if !text.is_empty() => {
                    sections.push(format!("Source ({url}):\n{text}"));
                }
                Ok(_) => debug!(url = %url, "Reference URL yielded no text"),
                Err(e) => warn!(url = %url, "Reference URL fetch failed, skipping: {}", e),
            }
        }

        if sections.is_empty() {
            None
        } else {
            Some(sections.join("\n\n"))
        }
    }

    async fn fetch_url(&self, url: &str) -> ProviderResult<String> {
        let response = self
            .http
            .get(url)
            .timeout(Duration::from_secs(15))
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(SEARCH_PROVIDER, &e))?;

        if !response.status().is_success() {
            return Err(ProviderError::from_status(
                SEARCH_PROVIDER,
                response.status().as_u16(),
                "",
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(SEARCH_PROVIDER, &e))?;

        Ok(truncate_chars(&strip_markup(&body), self.per_source_chars))
    }
}

/// Render search results into a prompt-ready context block.
fn render_search_results(results: &[SearchResult], budget: usize) -> String {
    let mut out = String::from("Web search results:\n");
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({})\n{}\n",
            i + 1,
            result.title,
            result.url,
            truncate_chars(&result.content, budget / results.len().max(1)),
        ));
    }
    out
}

/// Strip HTML tags and script/style blocks, collapsing whitespace.
fn strip_markup(html: &str) -> String {
    fn starts_with_ci(haystack: &str, at: usize, needle: &str) -> bool {
        haystack
            .get(at..at + needle.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(needle))
    }

    let mut out = String::with_capacity(html.len() / 4);
    let mut chars = html.char_indices();
    let mut in_tag = false;
    let mut skip_until: Option<&str> = None;

    while let Some((i, c)) = chars.next() {
        if let Some(closer) = skip_until {
            if starts_with_ci(html, i, closer) {
                skip_until = None;
                // Consume the closing tag
                for _ in 0..closer.len() - 1 {
                    chars.next();
                }
            }
            continue;
        }

        if c == '<' {
            if starts_with_ci(html, i, "<script") {
                skip_until = Some("</script>");
            } else if starts_with_ci(html, i, "<style") {
                skip_until = Some("</style>");
            } else {
                in_tag = true;
            }
            continue;
        }
        if in_tag {
            if c == '>' {
                in_tag = false;
                out.push(' ');
            }
            continue;
        }
        out.push(c);
    }

    // Collapse runs of whitespace
    let mut collapsed = String::with_capacity(out.len());
    let mut last_space = true;
    for c in out.chars() {
        if c.is_whitespace() {
            if !last_space {
                collapsed.push(' ');
                last_space = true;
            }
        } else {
            collapsed.push(c);
            last_space = false;
        }
    }
    collapsed.trim().to_string()
}

/// Truncate to a character budget on a char boundary.
fn truncate_chars(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        text.to_string()
    } else {
        text.chars().take(budget).collect()
    }
}
