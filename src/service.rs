//! Query operations over the LangChain documentation site, source repository
//! and package index.
//!
//! Every operation has the same shape: build a deterministic cache key, return
//! the cached value while it is fresh, otherwise fetch upstream, extract
//! records, cache them and return. Both front ends ([`crate::mcp`] and
//! [`crate::http`]) are thin adapters over [`DocsService`].

use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::cache::{ResponseCache, cache_key};
use crate::category;
use crate::config::Settings;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::introspect::{PythonClassIntrospector, SourceIntrospector};
use crate::markup;
use crate::models::{
    ApiReference, CodeSearchResponse, DocSearchResult, GitHubExample, TutorialInfo, UNKNOWN_VERSION,
    VersionInfo,
};

/// Documentation sections scanned by [`DocsService::search_documentation`], in
/// scan order.
pub const DOC_SECTIONS: &[&str] = &[
    "/docs/introduction/",
    "/docs/tutorials/",
    "/docs/how_to/",
    "/docs/concepts/",
    "/docs/integrations/providers/",
    "/api_reference/",
];

const TUTORIALS_PATH: &str = "/docs/tutorials/";
const API_REFERENCE_PATH: &str = "/api_reference/";
const API_SEARCH_PATH: &str = "/api_reference/search.html";
const TUTORIAL_KEYWORDS: &[&str] = &["tutorials", "concepts", "introduction", "how_to", "integrations"];
const PYPI_PROJECT_URL: &str = "https://pypi.org/project/langchain/";

const SUMMARY_LENGTH: usize = 200;
const API_SUMMARY_LENGTH: usize = 150;
/// Examples at or above this many bytes are skipped, not truncated.
pub const MAX_EXAMPLE_BYTES: usize = 5000;
pub const MAX_TUTORIALS: usize = 10;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A single named resource was asked for and does not exist upstream.
    #[error("{0}")]
    NotFound(String),

    /// A page the operation cannot do without could not be fetched.
    #[error("{0}")]
    Upstream(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}

pub struct DocsService {
    settings: Settings,
    fetcher: Arc<dyn Fetcher>,
    introspector: Arc<dyn SourceIntrospector>,
    cache: Arc<ResponseCache>,
}

impl DocsService {
    pub fn new(settings: Settings) -> Self {
        let fetcher = HttpFetcher::with_github_token(&settings.github_api_base, settings.github_token.clone());
        let cache = ResponseCache::new(settings.cache_ttl());
        Self::with_parts(
            settings,
            Arc::new(fetcher),
            Arc::new(PythonClassIntrospector::new()),
            Arc::new(cache),
        )
    }

    pub fn with_parts(
        settings: Settings,
        fetcher: Arc<dyn Fetcher>,
        introspector: Arc<dyn SourceIntrospector>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            introspector,
            cache,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Drops every cached response. Returns the number of entries removed.
    pub async fn clear_cache(&self) -> usize {
        let removed = self.cache.clear().await;
        tracing::info!("Response cache cleared ({} entries)", removed);
        removed
    }

    /// Scans the fixed documentation sections for pages whose HTML mentions
    /// `query` (case-insensitive). Unreachable sections are skipped.
    pub async fn search_documentation(&self, query: &str, limit: usize) -> Result<Vec<DocSearchResult>, ServiceError> {
        let key = cache_key("search_docs", &[json!(query), json!(limit)]);
        self.cache
            .get_or_try_insert_with(&key, self.cache.default_ttl(), || async {
                let needle = query.to_lowercase();
                let mut results = Vec::new();

                for section in DOC_SECTIONS {
                    if results.len() >= limit {
                        break;
                    }
                    let Some(url) = self.docs_url(section) else {
                        continue;
                    };
                    let Some(content) = self.fetcher.fetch_text(&url, self.settings.request_timeout()).await else {
                        continue;
                    };
                    if !content.to_lowercase().contains(&needle) {
                        continue;
                    }

                    let title = markup::find_title(&content).unwrap_or_else(|| section_title(section));
                    let summary = match markup::find_meta_description(&content) {
                        Some(description) => markup::truncate(&description, SUMMARY_LENGTH),
                        None => markup::find_first_paragraph(&content)
                            .map(|p| markup::extract_text(&p, SUMMARY_LENGTH))
                            .unwrap_or_default(),
                    };

                    results.push(DocSearchResult {
                        title,
                        url,
                        summary,
                        category: category::classify(section).to_string(),
                        last_updated: Some(today()),
                    });
                }

                results.truncate(limit);
                tracing::info!("Found {} documentation results for '{}'", results.len(), query);
                Ok(results)
            })
            .await
    }

    /// Looks up `class_name` through code search and introspects the first
    /// matching source file.
    pub async fn get_api_reference(&self, class_name: &str) -> Result<ApiReference, ServiceError> {
        let key = cache_key("api_reference", &[json!(class_name)]);
        self.cache
            .get_or_try_insert_with(&key, self.cache.default_ttl(), || async {
                let hits = self.code_search(&format!("{} language:python", class_name)).await?;
                let Some(hit) = hits.items.into_iter().next() else {
                    return Err(ServiceError::NotFound(format!(
                        "Class '{}' not found in LangChain repository",
                        class_name
                    )));
                };

                let Some(source) = self.fetcher.fetch_text(&hit.raw_url(), self.settings.request_timeout()).await else {
                    return Err(ServiceError::Upstream(format!(
                        "Could not fetch source code for '{}'",
                        class_name
                    )));
                };

                let info = self.introspector.class_info(&source, class_name);
                let description = if info.description.is_empty() {
                    format!("LangChain {} class", class_name)
                } else {
                    info.description
                };

                tracing::info!("Retrieved API reference for class: {}", class_name);
                Ok(ApiReference {
                    class_name: class_name.to_string(),
                    module_path: hit.module_path(),
                    description,
                    methods: info.methods,
                    parameters: Default::default(),
                    examples: Vec::new(),
                    source_url: hit.html_url,
                })
            })
            .await
    }

    /// Fetches small Python files matching `query` (or "example") from the
    /// repository. Hits that cannot be fetched or are too large are dropped, so
    /// fewer than `limit` examples may come back.
    pub async fn get_github_examples(&self, query: Option<&str>, limit: usize) -> Result<Vec<GitHubExample>, ServiceError> {
        let key = cache_key("github_examples", &[json!(query), json!(limit)]);
        self.cache
            .get_or_try_insert_with(&key, self.cache.default_ttl(), || async {
                let term = query.filter(|q| !q.trim().is_empty()).unwrap_or("example");
                let hits = match self.code_search(&format!("extension:py {}", term)).await {
                    Ok(hits) => hits,
                    Err(e) => {
                        tracing::warn!("Example search for '{}' failed: {}", term, e);
                        return Ok(Vec::new());
                    }
                };

                let mut examples = Vec::new();
                for item in hits.items.into_iter().take(limit) {
                    let Some(content) = self.fetcher.fetch_text(&item.raw_url(), self.settings.request_timeout()).await else {
                        continue;
                    };
                    if content.len() >= MAX_EXAMPLE_BYTES {
                        tracing::debug!("Skipping {} ({} bytes)", item.path, content.len());
                        continue;
                    }
                    examples.push(GitHubExample {
                        filename: item.name,
                        content,
                        description: format!("Example from {}", item.path),
                        url: item.html_url,
                    });
                }

                tracing::info!("Found {} GitHub examples for '{}'", examples.len(), term);
                Ok(examples)
            })
            .await
    }

    /// Collects tutorial links from the tutorials page, de-duplicated by URL
    /// and capped at [`MAX_TUTORIALS`]. Fails when the page is unreachable.
    pub async fn get_tutorials(&self) -> Result<Vec<TutorialInfo>, ServiceError> {
        let key = cache_key("tutorials", &[]);
        self.cache
            .get_or_try_insert_with(&key, self.cache.default_ttl(), || async {
                let content = match self.docs_url(TUTORIALS_PATH) {
                    Some(url) => self.fetcher.fetch_text(&url, self.settings.request_timeout()).await,
                    None => None,
                };
                let Some(content) = content else {
                    return Err(ServiceError::Upstream("Could not fetch tutorials page".to_string()));
                };

                let mut seen = HashSet::new();
                let tutorials: Vec<TutorialInfo> = markup::find_anchors(&content)
                    .into_iter()
                    .filter(|a| a.href.starts_with("/docs/"))
                    .filter(|a| TUTORIAL_KEYWORDS.iter().any(|k| a.href.contains(k)))
                    .filter(|a| a.text.chars().count() > 3)
                    .filter_map(|a| {
                        let url = self.docs_url(&a.href)?;
                        let category = category::classify_tutorial(&a.href);
                        Some(TutorialInfo {
                            description: format!("LangChain tutorial: {}", a.text),
                            title: a.text,
                            url,
                            category: category.to_string(),
                            topics: vec![category.to_lowercase().replace(' ', "_")],
                        })
                    })
                    .filter(|t| seen.insert(t.url.clone()))
                    .take(MAX_TUTORIALS)
                    .collect();

                tracing::info!("Found {} tutorials", tutorials.len());
                Ok(tutorials)
            })
            .await
    }

    /// Reads the latest release from the package index. A missing version is
    /// reported as [`UNKNOWN_VERSION`], not as an error.
    pub async fn get_latest_version(&self) -> Result<VersionInfo, ServiceError> {
        let key = cache_key("latest_version", &[]);
        self.cache
            .get_or_try_insert_with(&key, self.cache.default_ttl(), || async {
                let Some(data) = self
                    .fetcher
                    .fetch_json(&self.settings.pypi_json_url, self.settings.request_timeout())
                    .await
                else {
                    return Err(ServiceError::Upstream("Could not fetch version information".to_string()));
                };

                let info = &data["info"];
                let latest_version = info["version"].as_str().unwrap_or(UNKNOWN_VERSION).to_string();
                let release_date = data["releases"][latest_version.as_str()][0]["upload_time_iso_8601"]
                    .as_str()
                    .map(str::to_string);

                tracing::info!("Retrieved version info: {}", latest_version);
                Ok(VersionInfo {
                    latest_version,
                    description: text_field(info, "summary"),
                    author: text_field(info, "author"),
                    homepage: text_field(info, "home_page"),
                    release_date,
                    python_requires: text_field(info, "requires_python"),
                    pypi_url: PYPI_PROJECT_URL.to_string(),
                    documentation_url: self.settings.docs_base.clone(),
                })
            })
            .await
    }

    /// Searches the API reference for links mentioning `query`, falling back to
    /// the reference index page when the search page is unreachable.
    pub async fn search_api_reference(&self, query: &str, limit: usize) -> Result<Vec<DocSearchResult>, ServiceError> {
        let key = cache_key("search_api", &[json!(query), json!(limit)]);
        self.cache
            .get_or_try_insert_with(&key, self.cache.default_ttl(), || async {
                let timeout = self.settings.request_timeout();
                let search_url = self
                    .docs_url(API_SEARCH_PATH)
                    .and_then(|base| Url::parse_with_params(&base, &[("q", query)]).ok());

                let mut content = match search_url {
                    Some(url) => self.fetcher.fetch_text(url.as_str(), timeout).await,
                    None => None,
                };
                if content.is_none() {
                    tracing::debug!("API search page unavailable, falling back to reference index");
                    if let Some(url) = self.docs_url(API_REFERENCE_PATH) {
                        content = self.fetcher.fetch_text(&url, timeout).await;
                    }
                }
                let Some(content) = content else {
                    tracing::warn!("API reference unavailable for query '{}'", query);
                    return Ok(Vec::new());
                };

                let needle = query.to_lowercase();
                let results: Vec<DocSearchResult> = markup::find_anchors(&content)
                    .into_iter()
                    .filter(|a| a.href.contains("api_reference") && !a.text.is_empty())
                    .filter(|a| a.text.to_lowercase().contains(&needle) || a.href.to_lowercase().contains(&needle))
                    .filter_map(|a| {
                        let url = self.docs_url(&a.href)?;
                        let summary = if a.context.chars().count() > a.text.chars().count() {
                            markup::extract_text(&a.context, API_SUMMARY_LENGTH)
                        } else {
                            format!("API reference for {}", a.text)
                        };
                        Some(DocSearchResult {
                            title: a.text,
                            url,
                            summary,
                            category: "API Reference".to_string(),
                            last_updated: Some(today()),
                        })
                    })
                    .take(limit)
                    .collect();

                tracing::info!("Found {} API reference results for '{}'", results.len(), query);
                Ok(results)
            })
            .await
    }

    /// Runs a code search scoped to the configured repository. An unreachable
    /// or malformed search response counts as zero hits.
    async fn code_search(&self, terms: &str) -> Result<CodeSearchResponse, ServiceError> {
        let base = format!("{}/search/code", self.settings.github_api_base.trim_end_matches('/'));
        let q = format!("{} repo:{}", terms, self.settings.github_repo);
        let url = Url::parse_with_params(&base, &[("q", q.as_str())])
            .map_err(|e| ServiceError::Upstream(format!("Invalid code search URL {}: {}", base, e)))?;

        let Some(value) = self.fetcher.fetch_json(url.as_str(), self.settings.request_timeout()).await else {
            return Ok(CodeSearchResponse::default());
        };
        Ok(serde_json::from_value(value)
            .inspect_err(|e| tracing::warn!("Unexpected code search response: {}", e))
            .unwrap_or_default())
    }

    /// Resolves `href` against the documentation base URL.
    fn docs_url(&self, href: &str) -> Option<String> {
        Url::parse(&self.settings.docs_base)
            .and_then(|base| base.join(href))
            .inspect_err(|e| tracing::warn!("Cannot resolve {} against {}: {}", href, self.settings.docs_base, e))
            .ok()
            .map(String::from)
    }
}

/// Fallback title for a section page: its last path segment, title-cased.
fn section_title(section: &str) -> String {
    let segment = section.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    segment
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn text_field(info: &Value, key: &str) -> String {
    info[key].as_str().unwrap_or_default().to_string()
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
