//! LangChain Documentation MCP Service
//!
//! Fetches live content from the LangChain documentation site, the LangChain
//! source repository and the package index, extracts a little structure from
//! it and serves the result through MCP tools and a read-only HTTP API.
//!
//! # Features
//!
//! - Documentation and API reference search over the live docs site
//! - Class lookup with docstring and public method extraction from source
//! - Small code examples from the repository
//! - Tutorial listing and latest release information
//! - Short-lived in-memory response cache with single-flight misses
//!
//! # Modules
//!
//! - [`service`]: the query operations shared by both front ends
//! - [`fetch`], [`markup`], [`introspect`], [`category`]: fetching and extraction
//! - [`cache`]: time-boxed response cache
//! - [`mcp`]: MCP server implementation
//! - [`http`]: HTTP query routes
//! - [`server`]: process wiring for stdio, SSE and HTTP

pub mod cache;
pub mod category;
pub mod config;
pub mod fetch;
pub mod http;
pub mod introspect;
pub mod markup;
pub mod mcp;
pub mod models;
pub mod server;
pub mod service;
