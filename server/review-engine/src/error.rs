//! Structured error types for the review engine.

use thiserror::Error;

/// Errors surfaced to the binary. Analysis itself never fails hard.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("config: {field}: {reason}")]
  Config { field: String, reason: String },

  #[error("runtime: {0}")]
  Runtime(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

impl EngineError {
  pub fn config(field: &str, reason: &str) -> Self {
    Self::Config {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }
}

/// Failure of a remote collaborator (scoring oracle or summary generator).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
  #[error("missing API key: {env_var} is not set")]
  MissingApiKey { env_var: String },

  #[error("request failed: {status} - {message}")]
  Request { status: u16, message: String },

  #[error("malformed response: {0}")]
  Malformed(String),

  #[error("task failed: {0}")]
  TaskFailed(String),
}

impl OracleError {
  pub fn malformed(msg: impl Into<String>) -> Self {
    Self::Malformed(msg.into())
  }
}

/// A metrics backend could not handle a fragment. Always caught per file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
  #[error("language backend unavailable: {0}")]
  Language(String),

  #[error("syntax error near line {line}")]
  Syntax { line: usize },
}
