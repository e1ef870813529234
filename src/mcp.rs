//! LangChain documentation MCP implementation.
//!
//! Exposes the query operations of [`DocsService`] as MCP tools returning
//! formatted text, plus a small set of JSON resources.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use langchain_docs_mcp::config::Settings;
//! use langchain_docs_mcp::mcp::DocsServer;
//! use langchain_docs_mcp::service::DocsService;
//!
//! let service = Arc::new(DocsService::new(Settings::default()));
//! let server = DocsServer::new(service);
//! ```

use rmcp::model::{
    AnnotateAble, Implementation, ListResourcesResult, PaginatedRequestParam, ProtocolVersion, RawResource,
    ReadResourceRequestParam, ReadResourceResult, Resource, ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{Error as McpError, RoleServer, ServerHandler, schemars, tool};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::models::{ApiReference, DocSearchResult, GitHubExample, TutorialInfo, VersionInfo};
use crate::service::DocsService;

const DOCS_URI: &str = "langchain://docs";
const API_REFERENCE_URI: &str = "langchain://api-reference";
const TUTORIALS_URI: &str = "langchain://tutorials";
const EXAMPLES_URI: &str = "langchain://examples";
const VERSION_URI: &str = "langchain://version";

const REPOSITORY_URL: &str = "https://github.com/langchain-ai/langchain";
/// Example bodies longer than this are cut in tool output.
const EXAMPLE_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchDocsRequest {
    #[schemars(description = "Search query for documentation")]
    pub query: String,
    #[schemars(description = "Maximum number of results (default: 10, range 1-20)")]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchApiReferenceRequest {
    #[schemars(description = "Search query for API reference")]
    pub query: String,
    #[schemars(description = "Maximum number of results (default: 5, range 1-10)")]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ApiReferenceRequest {
    #[schemars(description = "Name of the LangChain class (e.g., 'ChatOpenAI', 'LLMChain')")]
    pub class_name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GithubExamplesRequest {
    #[schemars(description = "Optional search term to filter examples")]
    pub query: Option<String>,
    #[schemars(description = "Maximum number of examples (default: 5, range 1-10)")]
    pub limit: Option<u32>,
}

/// MCP server handler over a shared [`DocsService`].
#[derive(Clone)]
pub struct DocsServer {
    service: Arc<DocsService>,
}

#[tool(tool_box)]
impl DocsServer {
    pub fn new(service: Arc<DocsService>) -> Self {
        Self { service }
    }

    #[tool(description = "Search through LangChain documentation for specific topics")]
    async fn search_docs(&self, #[tool(aggr)] params: SearchDocsRequest) -> String {
        let limit = clamp_limit(params.limit, 10, 20);
        match self.service.search_documentation(&params.query, limit).await {
            Ok(results) => format_doc_results(&params.query, &results),
            Err(e) => format!("Error searching documentation for '{}': {}", params.query, e),
        }
    }

    #[tool(description = "Search specifically through LangChain API reference documentation")]
    async fn search_api_reference(&self, #[tool(aggr)] params: SearchApiReferenceRequest) -> String {
        let limit = clamp_limit(params.limit, 5, 10);
        match self.service.search_api_reference(&params.query, limit).await {
            Ok(results) => format_api_results(&params.query, &results),
            Err(e) => format!("Error searching API reference for '{}': {}", params.query, e),
        }
    }

    #[tool(description = "Get detailed API reference for a specific LangChain class")]
    async fn get_api_reference(&self, #[tool(aggr)] params: ApiReferenceRequest) -> String {
        match self.service.get_api_reference(&params.class_name).await {
            Ok(reference) => format_api_reference(&reference),
            Err(e) => format!("Error getting API reference for '{}': {}", params.class_name, e),
        }
    }

    #[tool(description = "Get real code examples from the LangChain GitHub repository")]
    async fn get_github_examples(&self, #[tool(aggr)] params: GithubExamplesRequest) -> String {
        let limit = clamp_limit(params.limit, 5, 10);
        let query = params.query.as_deref();
        match self.service.get_github_examples(query, limit).await {
            Ok(examples) => format_examples(query, &examples),
            Err(e) => format!("Error getting code examples: {}", e),
        }
    }

    #[tool(description = "Get available LangChain tutorials and learning resources")]
    async fn get_tutorials(&self) -> String {
        match self.service.get_tutorials().await {
            Ok(tutorials) => format_tutorials(&tutorials),
            Err(e) => format!("Error getting tutorials: {}", e),
        }
    }

    #[tool(description = "Get the latest LangChain version information from PyPI")]
    async fn get_latest_version(&self) -> String {
        match self.service.get_latest_version().await {
            Ok(version) => format_version(&version),
            Err(e) => format!("Error getting version information: {}", e),
        }
    }

    /// JSON body of the resource at `uri`.
    async fn resource_json(&self, uri: &str) -> Result<String, McpError> {
        let value = match uri {
            DOCS_URI => json!({
                "description": "LangChain Documentation Access",
                "available_sections": ["introduction", "tutorials", "how_to", "concepts", "integrations", "api_reference"],
                "usage": "Use the search_docs tool to search through documentation",
                "base_url": self.service.settings().docs_base,
            }),
            API_REFERENCE_URI => json!({
                "description": "LangChain API Reference",
                "usage": "Use the get_api_reference tool with a class name",
                "examples": ["ChatOpenAI", "LLMChain", "VectorStoreRetriever"],
                "github_source": REPOSITORY_URL,
            }),
            TUTORIALS_URI => {
                let tutorials = self.service.get_tutorials().await
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                json!({
                    "description": "LangChain Tutorials and Guides",
                    "tutorials": tutorials,
                })
            }
            EXAMPLES_URI => json!({
                "description": "LangChain Code Examples",
                "usage": "Use the get_github_examples tool to fetch real examples",
                "repository": REPOSITORY_URL,
            }),
            VERSION_URI => {
                let version_info = self.service.get_latest_version().await
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                json!({
                    "description": "LangChain Version Information",
                    "version_info": version_info,
                })
            }
            _ => {
                return Err(McpError::resource_not_found(
                    "resource_not_found",
                    Some(json!({ "uri": uri })),
                ));
            }
        };

        serde_json::to_string_pretty(&value).map_err(|e| McpError::internal_error(e.to_string(), None))
    }
}

#[tool(tool_box)]
impl ServerHandler for DocsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "This server provides live access to LangChain documentation, API reference, \
                code examples from the LangChain repository, tutorials and release information. \
                Use 'search_docs' or 'search_api_reference' to find pages, 'get_api_reference' \
                for a single class, and 'get_latest_version' for the current release. \
                Results are cached for a few minutes.".to_string()
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: PaginatedRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult {
            resources: resources(),
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let body = self.resource_json(&uri).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(body, uri)],
        })
    }
}

fn resources() -> Vec<Resource> {
    [
        (DOCS_URI, "LangChain Documentation", "Official LangChain documentation and guides"),
        (API_REFERENCE_URI, "LangChain API Reference", "Complete API reference for LangChain classes and functions"),
        (TUTORIALS_URI, "LangChain Tutorials", "Step-by-step tutorials and learning resources"),
        (EXAMPLES_URI, "LangChain Code Examples", "Real code examples from the LangChain GitHub repository"),
        (VERSION_URI, "LangChain Version Info", "Latest version information and release details"),
    ]
    .into_iter()
    .map(|(uri, name, description)| {
        let mut resource = RawResource::new(uri, name.to_string());
        resource.description = Some(description.to_string());
        resource.mime_type = Some("application/json".to_string());
        resource.no_annotation()
    })
    .collect()
}

fn clamp_limit(limit: Option<u32>, default: u32, max: u32) -> usize {
    limit.unwrap_or(default).clamp(1, max) as usize
}

fn format_doc_results(query: &str, results: &[DocSearchResult]) -> String {
    if results.is_empty() {
        return format!("No documentation found for query: '{}'", query);
    }
    let blocks: Vec<String> = results
        .iter()
        .map(|r| format!("**{}** ({})\nURL: {}\nSummary: {}\n", r.title, r.category, r.url, r.summary))
        .collect();
    format!(
        "Found {} documentation results for '{}':\n\n{}",
        results.len(),
        query,
        blocks.join("\n---\n")
    )
}

fn format_api_results(query: &str, results: &[DocSearchResult]) -> String {
    if results.is_empty() {
        return format!("No API reference found for query: '{}'", query);
    }
    let blocks: Vec<String> = results
        .iter()
        .map(|r| format!("**{}**\nURL: {}\nDescription: {}\n", r.title, r.url, r.summary))
        .collect();
    format!(
        "Found {} API reference results for '{}':\n\n{}",
        results.len(),
        query,
        blocks.join("\n---\n")
    )
}

fn format_api_reference(reference: &ApiReference) -> String {
    let methods = if reference.methods.is_empty() {
        "No methods found".to_string()
    } else {
        reference.methods.join(", ")
    };
    format!(
        "**{}** API Reference\n\n**Module:** {}\n**Description:** {}\n**Methods:** {}\n**Source:** {}\n",
        reference.class_name, reference.module_path, reference.description, methods, reference.source_url
    )
}

fn format_examples(query: Option<&str>, examples: &[GitHubExample]) -> String {
    let search_info = query.map(|q| format!(" for '{}'", q)).unwrap_or_default();
    if examples.is_empty() {
        return format!("No code examples found{}", search_info);
    }
    let blocks: Vec<String> = examples
        .iter()
        .map(|example| {
            let content = match example.content.char_indices().nth(EXAMPLE_PREVIEW_CHARS) {
                Some((cut, _)) => format!(
                    "{}...\n\n[Content truncated - see full example at URL]",
                    &example.content[..cut]
                ),
                None => example.content.clone(),
            };
            format!(
                "**{}**\nDescription: {}\nURL: {}\n```python\n{}\n```",
                example.filename, example.description, example.url, content
            )
        })
        .collect();
    format!(
        "Found {} code examples{}:\n\n{}",
        examples.len(),
        search_info,
        blocks.join("\n\n---\n\n")
    )
}

fn format_tutorials(tutorials: &[TutorialInfo]) -> String {
    if tutorials.is_empty() {
        return "No tutorials found".to_string();
    }
    let blocks: Vec<String> = tutorials
        .iter()
        .map(|t| {
            format!(
                "**{}** ({})\nDescription: {}\nURL: {}\nTopics: {}",
                t.title,
                t.category,
                t.description,
                t.url,
                t.topics.join(", ")
            )
        })
        .collect();
    format!(
        "Found {} LangChain tutorials:\n\n{}",
        tutorials.len(),
        blocks.join("\n\n---\n\n")
    )
}

fn format_version(version: &VersionInfo) -> String {
    let mut response = format!(
        "**LangChain Version Information**\n\n\
        **Latest Version:** {}\n\
        **Description:** {}\n\
        **Author:** {}\n\
        **Homepage:** {}\n\
        **Python Requirements:** {}\n\
        **PyPI URL:** {}\n\
        **Documentation:** {}\n",
        version.latest_version,
        version.description,
        version.author,
        version.homepage,
        version.python_requires,
        version.pypi_url,
        version.documentation_url
    );
    if let Some(date) = &version.release_date {
        response.push_str(&format!("**Release Date:** {}\n", date));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::{StubFetcher, service};

    fn setup_server(fetcher: StubFetcher) -> DocsServer {
        DocsServer::new(Arc::new(service(Arc::new(fetcher))))
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 10, 20), 10);
        assert_eq!(clamp_limit(Some(0), 10, 20), 1);
        assert_eq!(clamp_limit(Some(50), 10, 20), 20);
        assert_eq!(clamp_limit(Some(7), 5, 10), 7);
    }

    #[test]
    fn test_resources_listed() {
        let resources = resources();
        assert_eq!(resources.len(), 5);
        assert!(resources.iter().any(|r| r.raw.uri == VERSION_URI));
        assert!(resources.iter().all(|r| r.raw.mime_type.as_deref() == Some("application/json")));
    }

    #[tokio::test]
    async fn test_search_docs_without_results() {
        let server = setup_server(StubFetcher::default());
        let text = server
            .search_docs(SearchDocsRequest { query: "nothing".to_string(), limit: None })
            .await;
        assert_eq!(text, "No documentation found for query: 'nothing'");
    }

    #[tokio::test]
    async fn test_get_api_reference_not_found_is_text() {
        let server = setup_server(StubFetcher::default());
        let text = server
            .get_api_reference(ApiReferenceRequest { class_name: "Nonexistent123".to_string() })
            .await;
        assert!(text.starts_with("Error getting API reference for 'Nonexistent123':"));
        assert!(text.contains("not found"));
    }

    #[tokio::test]
    async fn test_get_tutorials_unreachable_is_text() {
        let server = setup_server(StubFetcher::default());
        assert_eq!(
            server.get_tutorials().await,
            "Error getting tutorials: Could not fetch tutorials page"
        );
    }

    #[tokio::test]
    async fn test_static_resource_json() {
        let server = setup_server(StubFetcher::default());
        let body = server.resource_json(API_REFERENCE_URI).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["github_source"], REPOSITORY_URL);

        let body = server.resource_json(DOCS_URI).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["base_url"], "http://docs.test");
    }

    #[tokio::test]
    async fn test_version_resource_uses_service() {
        let fetcher = StubFetcher::default().with_json(
            "http://docs.test/pypi/langchain/json",
            json!({"info": {"version": "0.3.0"}, "releases": {}}),
        );
        let server = setup_server(fetcher);
        let body = server.resource_json(VERSION_URI).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["version_info"]["latest_version"], "0.3.0");
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let server = setup_server(StubFetcher::default());
        assert!(server.resource_json("langchain://nope").await.is_err());
        assert!(server.resource_json(TUTORIALS_URI).await.is_err());
    }

    #[test]
    fn test_format_examples_truncates_long_content() {
        let examples = vec![GitHubExample {
            filename: "agent.py".to_string(),
            content: "a".repeat(600),
            url: "https://github.com/langchain-ai/langchain/blob/master/agent.py".to_string(),
            description: "Example from agent.py".to_string(),
        }];
        let text = format_examples(Some("agent"), &examples);
        assert!(text.starts_with("Found 1 code examples for 'agent':"));
        assert!(text.contains(&format!("{}...\n\n[Content truncated", "a".repeat(500))));
        assert!(!text.contains(&"a".repeat(501)));
        assert_eq!(format_examples(None, &[]), "No code examples found");
    }

    #[test]
    fn test_format_version_release_date_optional() {
        let mut version = VersionInfo {
            latest_version: "0.3.25".to_string(),
            description: String::new(),
            author: String::new(),
            homepage: String::new(),
            release_date: None,
            python_requires: ">=3.9".to_string(),
            pypi_url: "https://pypi.org/project/langchain/".to_string(),
            documentation_url: "https://python.langchain.com".to_string(),
        };
        let text = format_version(&version);
        assert!(text.contains("**Latest Version:** 0.3.25\n"));
        assert!(!text.contains("Release Date"));

        version.release_date = Some("2025-05-02T18:39:04Z".to_string());
        assert!(format_version(&version).ends_with("**Release Date:** 2025-05-02T18:39:04Z\n"));
    }

    #[test]
    fn test_format_doc_results() {
        let results = vec![DocSearchResult {
            title: "How-to guides".to_string(),
            url: "https://python.langchain.com/docs/how_to/".to_string(),
            summary: "Answers".to_string(),
            category: "How-To Guides".to_string(),
            last_updated: None,
        }];
        assert_eq!(
            format_doc_results("agent", &results),
            "Found 1 documentation results for 'agent':\n\n**How-to guides** (How-To Guides)\nURL: https://python.langchain.com/docs/how_to/\nSummary: Answers\n"
        );
    }
}
