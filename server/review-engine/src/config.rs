//! Engine configuration with sane defaults.

use std::env;

use crate::error::EngineError;

/// Remote client settings and prompt sizing.
#[derive(Debug, Clone)]
pub struct Config {
  /// OpenAI-compatible chat completions endpoint.
  pub api_url: String,
  /// Model used for both the summary and the scoring call.
  pub model: String,
  /// Name of the environment variable holding the API key.
  pub api_key_env: String,
  pub temperature: f32,
  pub max_tokens: u32,
  /// Files listed individually in the summary prompt.
  pub summary_file_limit: usize,
  /// Per-request timeout. `None` waits indefinitely.
  pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api_url: "https://api.openai.com/v1/chat/completions".to_string(),
      model: "gpt-4o-mini".to_string(),
      api_key_env: "OPENAI_API_KEY".to_string(),
      temperature: 0.2,
      max_tokens: 1024,
      summary_file_limit: 5,
      request_timeout_secs: None,
    }
  }
}

impl Config {
  /// Defaults overridden by `REVIEW_ENGINE_*` environment variables.
  pub fn from_env() -> Result<Self, EngineError> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EngineError> {
    let mut config = Self::default();
    if let Some(url) = lookup("REVIEW_ENGINE_API_URL") {
      config.api_url = url;
    }
    if let Some(model) = lookup("REVIEW_ENGINE_MODEL") {
      config.model = model;
    }
    if let Some(name) = lookup("REVIEW_ENGINE_API_KEY_ENV") {
      config.api_key_env = name;
    }
    if let Some(raw) = lookup("REVIEW_ENGINE_SUMMARY_FILES") {
      config.summary_file_limit = raw
        .parse()
        .map_err(|_| EngineError::config("REVIEW_ENGINE_SUMMARY_FILES", "expected a count"))?;
    }
    if let Some(raw) = lookup("REVIEW_ENGINE_TIMEOUT_SECS") {
      let secs: u64 = raw
        .parse()
        .map_err(|_| EngineError::config("REVIEW_ENGINE_TIMEOUT_SECS", "expected seconds"))?;
      config.request_timeout_secs = Some(secs);
    }
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |key| map.get(key).cloned()
  }

  #[test]
  fn defaults_without_overrides() {
    let config = Config::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(config.model, "gpt-4o-mini");
    assert_eq!(config.summary_file_limit, 5);
    assert!(config.request_timeout_secs.is_none());
  }

  #[test]
  fn overrides_apply() {
    let config = Config::from_lookup(lookup_from(&[
      ("REVIEW_ENGINE_MODEL", "gpt-4o"),
      ("REVIEW_ENGINE_TIMEOUT_SECS", "30"),
    ]))
    .unwrap();
    assert_eq!(config.model, "gpt-4o");
    assert_eq!(config.request_timeout_secs, Some(30));
  }

  #[test]
  fn bad_number_is_a_config_error() {
    let err = Config::from_lookup(lookup_from(&[("REVIEW_ENGINE_TIMEOUT_SECS", "soon")]))
      .unwrap_err();
    assert!(err.to_string().contains("REVIEW_ENGINE_TIMEOUT_SECS"));
  }
}
