//! Source-level class introspection.
//!
//! The default [`PythonClassIntrospector`] is a textual heuristic, not a
//! parser. Known blind spots:
//!
//! - a class definition without a parenthesised base list is not found
//! - nested classes are not distinguished from top-level ones
//! - methods are collected from the definition to the end of the file, so
//!   methods of classes defined later in the same file are included
//! - signatures that break the line between `(` and `self` are missed
//!
//! Callers get "best effort" results and must not treat an empty answer as
//! proof that the class has no documentation or methods.

use regex::Regex;
use std::sync::LazyLock;

static DOCSTRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)"""(.*?)""""#).expect("Invalid docstring regex"));

static METHOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"def (\w+)\(self").expect("Invalid method regex"));

/// Description and public method names of one class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassInfo {
    pub description: String,
    pub methods: Vec<String>,
}

pub trait SourceIntrospector: Send + Sync {
    /// Looks up `class_name` in `source`. Returns an empty [`ClassInfo`] when
    /// the class cannot be located.
    fn class_info(&self, source: &str, class_name: &str) -> ClassInfo;
}

/// Regex-based introspection of Python sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonClassIntrospector;

/// Names starting with this prefix are private by convention.
const PRIVATE_PREFIX: char = '_';

impl PythonClassIntrospector {
    pub fn new() -> Self {
        Self
    }
}

impl SourceIntrospector for PythonClassIntrospector {
    fn class_info(&self, source: &str, class_name: &str) -> ClassInfo {
        let pattern = format!(r"class {}\([^)]*\):", regex::escape(class_name));
        let Ok(class_def) = Regex::new(&pattern) else {
            return ClassInfo::default();
        };
        let Some(found) = class_def.find(source) else {
            return ClassInfo::default();
        };

        let description = DOCSTRING
            .captures(&source[found.end()..])
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let methods = METHOD
            .captures_iter(&source[found.start()..])
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|name| !name.starts_with(PRIVATE_PREFIX))
            .map(str::to_string)
            .collect();

        ClassInfo { description, methods }
    }
}
