//! Keyword tables mapping URL paths to topical categories.
//!
//! Order in each table decides ties: the first keyword found in the path wins,
//! regardless of where in the path it occurs.

pub const GENERAL: &str = "General";

/// Categories for documentation sections and search results.
pub const SECTION_CATEGORIES: &[(&str, &str)] = &[
    ("introduction", "Introduction"),
    ("tutorials", "Tutorials"),
    ("how_to", "How-To Guides"),
    ("concepts", "Concepts"),
    ("integrations", "Integrations"),
    ("providers", "Providers"),
    ("api_reference", "API Reference"),
    ("chat", "Chat Models"),
    ("llms", "LLMs"),
    ("chains", "Chains"),
    ("agents", "Agents"),
    ("memory", "Memory"),
    ("retrievers", "Retrievers"),
    ("embeddings", "Embeddings"),
];

/// Categories for links on the tutorials page.
pub const TUTORIAL_CATEGORIES: &[(&str, &str)] = &[
    ("introduction", "Introduction"),
    ("tutorial", "Tutorials"),
    ("how_to", "How-To Guides"),
    ("concepts", "Concepts"),
    ("integrations", "Integrations"),
];

/// Label of the first `table` keyword contained in `path` (case-insensitive),
/// or [`GENERAL`].
pub fn classify_with(table: &[(&str, &'static str)], path: &str) -> &'static str {
    let path = path.to_lowercase();
    table
        .iter()
        .find(|(keyword, _)| path.contains(*keyword))
        .map(|(_, label)| *label)
        .unwrap_or(GENERAL)
}

pub fn classify(path: &str) -> &'static str {
    classify_with(SECTION_CATEGORIES, path)
}

pub fn classify_tutorial(href: &str) -> &'static str {
    classify_with(TUTORIAL_CATEGORIES, href)
}
