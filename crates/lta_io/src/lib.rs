//! crates/lta_io/src/lib.rs
//! I/O boundary of the allocation engine.
//!
//! - Loaders for LTA totals, partial requests, and job files (JSON + schema check).
//! - Canonical JSON (sorted keys, compact) with atomic writes.
//! - SHA-256 over canonical bytes.
//! - Configuration writer/reader: the persisted per-partial record a later
//!   automation run reloads.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for lta_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (create_dir_all, rename, fsync, etc.)
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON syntax or shape errors.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// JSON Schema validation failures.
    #[error("schema error at {pointer}: {msg}")]
    Schema { pointer: String, msg: String },

    /// Input file larger than the loader accepts.
    #[error("limit exceeded: {0}")]
    Limit(String),

    /// Stored digest does not match the stored content.
    #[error("digest mismatch for {what}: expected {expected}, found {found}")]
    Digest { what: &'static str, expected: String, found: String },

    /// Unsupported or inconsistent persisted record.
    #[error("invalid: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json has no pointer; line/column is the closest locator.
        IoError::Json { pointer: format!("line {} column {}", e.line(), e.column()), msg: e.to_string() }
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod schema;
pub mod loader;
pub mod config;
