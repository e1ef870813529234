//! Records returned by the query operations.
//!
//! All records are plain values built fresh per request; the cache keeps its
//! own serialized copy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel used when the package index does not report a version.
pub const UNKNOWN_VERSION: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocSearchResult {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub category: String,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiReference {
    pub class_name: String,
    pub module_path: String,
    pub description: String,
    pub methods: Vec<String>,
    /// Always empty: parameters are not extracted from source.
    pub parameters: Map<String, Value>,
    /// Always empty: examples are not extracted from source.
    pub examples: Vec<String>,
    pub source_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubExample {
    pub filename: String,
    pub content: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TutorialInfo {
    pub title: String,
    pub description: String,
    pub url: String,
    pub category: String,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionInfo {
    pub latest_version: String,
    pub description: String,
    pub author: String,
    pub homepage: String,
    pub release_date: Option<String>,
    pub python_requires: String,
    pub pypi_url: String,
    pub documentation_url: String,
}

/// One hit of the code-hosting search API.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CodeSearchItem {
    pub name: String,
    pub path: String,
    pub html_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CodeSearchResponse {
    #[serde(default)]
    pub items: Vec<CodeSearchItem>,
}

impl CodeSearchItem {
    /// Location of the raw file behind `html_url`.
    pub fn raw_url(&self) -> String {
        self.html_url
            .replace("github.com", "raw.githubusercontent.com")
            .replace("/blob/", "/")
    }

    /// Dotted module path: separators become dots and the `.py` extension is
    /// dropped.
    pub fn module_path(&self) -> String {
        let path = self.path.strip_suffix(".py").unwrap_or(&self.path);
        path.replace('/', ".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(path: &str, html_url: &str) -> CodeSearchItem {
        CodeSearchItem {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            html_url: html_url.to_string(),
        }
    }

    #[test]
    fn test_raw_url() {
        let hit = item(
            "libs/partners/openai/langchain_openai/chat_models/base.py",
            "https://github.com/langchain-ai/langchain/blob/master/libs/partners/openai/langchain_openai/chat_models/base.py",
        );
        assert_eq!(
            hit.raw_url(),
            "https://raw.githubusercontent.com/langchain-ai/langchain/master/libs/partners/openai/langchain_openai/chat_models/base.py"
        );
    }

    #[test]
    fn test_module_path() {
        let hit = item("libs/core/langchain_core/runnables/base.py", "");
        assert_eq!(hit.module_path(), "libs.core.langchain_core.runnables.base");
        assert_eq!(hit.name, "base.py");
    }

    #[test]
    fn test_search_response_without_items() {
        let response: CodeSearchResponse = serde_json::from_str(r#"{"total_count": 0}"#).unwrap();
        assert!(response.items.is_empty());
    }

    #[test]
    fn test_records_serialize_with_null_optionals() {
        let result = DocSearchResult {
            title: "Concepts".to_string(),
            url: "https://python.langchain.com/docs/concepts/".to_string(),
            summary: String::new(),
            category: "Concepts".to_string(),
            last_updated: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["last_updated"], Value::Null);
        assert_eq!(value["category"], "Concepts");
    }
}
