//! Memory dashboard backend: semantic memory storage behind MCP tools.
//!
//! memdash stores free-text memories with tags and timestamps in a local vector store
//! and exposes them as named operations for an MCP client or a dashboard. Every
//! operation goes through one [`tools::Dispatcher`], which validates arguments,
//! records query latency, and returns a JSON payload.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec) for
//!   nearest-neighbour search; tags and timestamps live in a JSON metadata column
//! - **Embeddings**: Local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions), or a
//!   deterministic hashed provider for tests and offline use
//! - **Recall**: time phrases such as "yesterday" or "last week" become a timestamp
//!   filter, anything else is a ranked similarity search
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files and environment variables
//! - [`db`] - SQLite initialization and schema
//! - [`embedding`] - Text-to-vector embedding providers
//! - [`error`] - Store and dispatch error types
//! - [`memory`] - Store adapter, tag and time filters, latency, health, backups
//! - [`tools`] - Operation catalog and request dispatcher

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod memory;
pub mod tools;
