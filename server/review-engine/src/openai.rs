//! OpenAI-compatible chat client backing both remote collaborators.
//!
//! Constructed explicitly and handed to the engine; there is no shared
//! global client. Uses ureq (sync HTTP); the engine runs calls on the
//! blocking pool.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::OracleError;
use crate::oracle::{parse_score_payload, ScoreMap, ScoringOracle, SummaryGenerator};
use crate::types::FileChange;

/// Characters of each patch included in the scoring prompt.
const MAX_PATCH_CHARS: usize = 4000;

const SUMMARY_SYSTEM: &str =
  "You are a technical assistant summarizing pull request changes.";

const SCORING_SYSTEM: &str = "You are a security reviewer. For every file in the pull request, \
decide whether the change introduces a vulnerability and rate how important the file is to review \
on a scale of 1 (trivial) to 10 (critical). Respond with JSON only, in the form \
{\"files\": [{\"filename\": string, \"status\": \"vulnerable\" | \"secure\", \
\"importance_score\": integer 1-10, \"vulnerability_summary\": string | null}]}.";

#[derive(Debug, Clone, Serialize)]
struct Message {
  role: &'static str,
  content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<Message>,
  max_tokens: u32,
  temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
  content: String,
}

pub struct OpenAiClient {
  config: Config,
  api_key: Option<String>,
  agent: ureq::Agent,
}

impl OpenAiClient {
  /// A missing key is not an error here; each call reports it instead.
  pub fn new(config: Config, api_key: Option<String>) -> Self {
    let agent = ureq::config::Config::builder()
      .http_status_as_error(false)
      .timeout_global(config.request_timeout_secs.map(Duration::from_secs))
      .build()
      .new_agent();
    Self {
      config,
      api_key,
      agent,
    }
  }

  /// Read the key from the variable named by `config.api_key_env`.
  pub fn from_env(config: Config) -> Self {
    let api_key = env::var(&config.api_key_env)
      .ok()
      .filter(|k| !k.trim().is_empty());
    Self::new(config, api_key)
  }

  pub fn has_api_key(&self) -> bool {
    self.api_key.is_some()
  }

  fn complete(&self, system: &str, user: String) -> Result<String, OracleError> {
    let api_key = self.api_key.as_deref().ok_or_else(|| OracleError::MissingApiKey {
      env_var: self.config.api_key_env.clone(),
    })?;

    let body = ChatRequest {
      model: &self.config.model,
      messages: vec![
        Message {
          role: "system",
          content: system.to_string(),
        },
        Message {
          role: "user",
          content: user,
        },
      ],
      max_tokens: self.config.max_tokens,
      temperature: self.config.temperature,
    };

    let response = self
      .agent
      .post(&self.config.api_url)
      .header("Content-Type", "application/json")
      .header("Authorization", &format!("Bearer {}", api_key))
      .send_json(&body)
      .map_err(|e| OracleError::Request {
        status: 0,
        message: e.to_string(),
      })?;

    let status = response.status().as_u16();
    if status >= 400 {
      let message = response.into_body().read_to_string().unwrap_or_default();
      return Err(OracleError::Request { status, message });
    }

    let parsed: ChatResponse = response
      .into_body()
      .read_json()
      .map_err(|e| OracleError::malformed(e.to_string()))?;

    parsed
      .choices
      .into_iter()
      .next()
      .map(|c| c.message.content.trim().to_string())
      .ok_or_else(|| OracleError::malformed("no response choices"))
  }
}

impl SummaryGenerator for OpenAiClient {
  fn summarize(&self, files: &[FileChange]) -> Result<String, OracleError> {
    let prompt = summary_prompt(files, self.config.summary_file_limit);
    let summary = self.complete(SUMMARY_SYSTEM, prompt)?;
    debug!(chars = summary.len(), "summary received");
    Ok(summary)
  }
}

impl ScoringOracle for OpenAiClient {
  fn score(&self, files: &[FileChange]) -> Result<ScoreMap, OracleError> {
    let reply = self.complete(SCORING_SYSTEM, scoring_prompt(files))?;
    let scores = parse_score_payload(&reply)?;
    debug!(scored = scores.len(), "scores received");
    Ok(scores)
  }
}

/// Totals plus the first `limit` files with their churn.
pub fn summary_prompt(files: &[FileChange], limit: usize) -> String {
  let additions: u32 = files.iter().map(|f| f.additions).sum();
  let deletions: u32 = files.iter().map(|f| f.deletions).sum();
  let listed: Vec<String> = files
    .iter()
    .take(limit)
    .map(|f| {
      format!(
        "- `{}`: {} additions, {} deletions.",
        f.filename, f.additions, f.deletions
      )
    })
    .collect();

  format!(
    "Summarize the main changes introduced in this pull request. \
     The pull request affects {} files with {} additions and {} deletions. \
     Please identify notable changes in functionality, logic, and any significant modifications. \
     Here are the most affected files:\n{}\n\n\
     Avoid general statements and focus on specifics, such as major updates, new feature introductions, \
     refactoring efforts, or improvements to code structure.",
    files.len(),
    additions,
    deletions,
    listed.join("\n")
  )
}

/// Every file with its (truncated) patch. Files without a patch are listed by name.
pub fn scoring_prompt(files: &[FileChange]) -> String {
  let mut prompt = String::from("Score each file in this pull request.\n\n");
  for file in files {
    prompt.push_str(&format!("### {}\n", file.filename));
    match file.patch.as_deref() {
      Some(patch) if !patch.is_empty() => {
        let truncated: String = patch.chars().take(MAX_PATCH_CHARS).collect();
        prompt.push_str("```diff\n");
        prompt.push_str(&truncated);
        if truncated.len() < patch.len() {
          prompt.push_str("\n... (truncated)");
        }
        prompt.push_str("\n```\n\n");
      }
      _ => prompt.push_str("(no textual diff)\n\n"),
    }
  }
  prompt
}
