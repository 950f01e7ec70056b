//! Core error types.

use std::path::PathBuf;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A push-channel payload that could not be decoded.
#[derive(Debug, thiserror::Error)]
#[error("malformed event payload: {0}")]
pub struct EventParseError(#[from] pub serde_json::Error);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionIdError {
    #[error("session id must not be empty")]
    Empty,

    #[error("session id must not contain whitespace: {0:?}")]
    Whitespace(String),
}
