//! Error taxonomy.
//!
//! Configuration problems are fatal at startup or build time; the process
//! must not start with an ambiguous route table and a build must not write
//! any output after a path collision. Gateway failures are not errors in
//! this taxonomy — they are mapped to 502/504 responses at the proxy
//! boundary and surfaced to the caller directly.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration errors, detected before serving or building.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("route prefix must not be empty")]
    EmptyPrefix,

    /// Two entries with the same prefix would tie on length for every path
    /// they match; precedence is never guessed at request time.
    #[error("duplicate route prefix '{0}'")]
    DuplicatePrefix(String),

    #[error("invalid target origin '{origin}' for prefix '{prefix}': {reason}")]
    InvalidOrigin {
        prefix: String,
        origin: String,
        reason: String,
    },

    #[error("output path collision: entries '{first}' and '{second}' both emit {path}")]
    OutputCollision {
        first: String,
        second: String,
        path: PathBuf,
    },

    #[error("entry point '{name}' source does not exist: {path}")]
    MissingEntrySource { name: String, path: PathBuf },
}
