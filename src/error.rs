//! Error types for repolens
//!
//! Handlers never surface these directly; they are mapped to conversation
//! text at the handler boundary. The binary and the analysis path wrap them
//! in `anyhow` with extra context.

use thiserror::Error;

/// Failure while retrieving a file body (or any other payload) from the
/// remote source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode content: {0}")]
    Decode(String),

    #[error("unsupported locator: {0}")]
    Unsupported(String),
}

/// Structured failure while validating API payloads into a repository
/// context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid entry `{path}`: {reason}")]
    InvalidEntry { path: String, reason: String },
}

/// A dependency manifest was found but could not be read.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid JSON manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML manifest: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unexpected manifest shape: {0}")]
    Shape(String),
}
