//! Runtime settings for the documentation gateway.
//!
//! Every field can be given as a command line flag or through the matching
//! environment variable. [`Settings::default`] mirrors the CLI defaults so the
//! library can be used without going through `clap`.

use clap::Args;
use std::time::Duration;

pub const DEFAULT_DOCS_BASE: &str = "https://python.langchain.com";
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_REPO: &str = "langchain-ai/langchain";
pub const DEFAULT_PYPI_JSON_URL: &str = "https://pypi.org/pypi/langchain/json";

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Base URL of the LangChain documentation site
    #[arg(long, env = "LANGCHAIN_DOCS_BASE", default_value = DEFAULT_DOCS_BASE)]
    pub docs_base: String,

    /// Base URL of the code-hosting API
    #[arg(long, env = "GITHUB_API_BASE", default_value = DEFAULT_GITHUB_API_BASE)]
    pub github_api_base: String,

    /// Repository (`owner/name`) that code searches are scoped to
    #[arg(long, env = "GITHUB_REPO", default_value = DEFAULT_GITHUB_REPO)]
    pub github_repo: String,

    /// Package index JSON endpoint for the langchain package
    #[arg(long, env = "PYPI_JSON_URL", default_value = DEFAULT_PYPI_JSON_URL)]
    pub pypi_json_url: String,

    /// Timeout for each outbound request, in seconds
    #[arg(long = "request-timeout", env = "REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Lifetime of cached responses, in seconds
    #[arg(long = "cache-ttl", env = "CACHE_TTL", default_value_t = 300)]
    pub cache_ttl_secs: u64,

    /// Optional token sent to the code-hosting API for higher rate limits
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Points every upstream at the same base URL. Used to aim the service at a
    /// local mock server.
    pub fn with_upstream(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            docs_base: base.to_string(),
            github_api_base: base.to_string(),
            pypi_json_url: format!("{}/pypi/langchain/json", base),
            ..Self::default()
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            docs_base: DEFAULT_DOCS_BASE.to_string(),
            github_api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            github_repo: DEFAULT_GITHUB_REPO.to_string(),
            pypi_json_url: DEFAULT_PYPI_JSON_URL.to_string(),
            request_timeout_secs: 30,
            cache_ttl_secs: 300,
            github_token: None,
        }
    }
}
