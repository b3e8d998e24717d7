//! # doc-tools
//!
//! Documentation automation for the Redpanda docs: a CLI and a
//! Model-Context-Protocol (MCP) server that fetch release metadata from
//! GitHub, generate reference pages by driving external generators, and
//! check the generated output.
//!
//! ## Features
//!
//! - Latest Redpanda, Console and Helm chart versions from GitHub releases
//! - Property, metrics, rpk, connector, Helm, CRD and cloud-region references
//! - OpenAPI bundling from proto sources and description drift reports
//! - Review of generated docs and incremental Algolia indexing
//!
//! ## Modules
//!
//! - `server`: MCP server implementation and tools
//! - `generate`: reference-documentation generators
//! - `proto`: OpenAPI description comparison against proto sources
//! - `github`: GitHub API integration for releases and file contents

/// Settings read from the environment
pub mod config;
/// Error type and the uniform tool result
pub mod error;
/// TTL cache with an injectable clock
pub mod cache;
/// Subprocess execution and temporary checkouts
pub mod exec;
/// GitHub API integration
pub mod github;
/// Release version lookups
pub mod versions;
/// Antora component helpers
pub mod antora;
/// Proto description comparison
pub mod proto;
/// OpenAPI loading, bundling and validation
pub mod openapi;
/// Reference documentation generators
pub mod generate;
/// Generated documentation review
pub mod review;
/// Algolia search indexing
pub mod algolia;
/// Guarded CLI passthrough
pub mod command;
/// Background jobs
pub mod jobs;
/// Server implementation and MCP tools
pub mod server;
