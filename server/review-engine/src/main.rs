//! Binary entrypoint: read one change set from stdin, write one report to stdout.
//!
//! Logs go to stderr (`RUST_LOG`, default `review_engine=info`) so stdout
//! stays a single JSON document.

use std::io::{self, Read, Write};
use std::sync::Arc;

use review_engine::openai::OpenAiClient;
use review_engine::types::ErrorOutput;
use review_engine::{ChangeSet, Config, Engine, EngineError};
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(io::stderr))
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("review_engine=info")))
    .init();

  if let Err(e) = run_binary() {
    let err = ErrorOutput::new(e.to_string());
    let _ = serde_json::to_writer(io::stdout(), &err);
    let _ = writeln!(io::stderr(), "review-engine error: {}", e);
    std::process::exit(1);
  }
}

fn run_binary() -> Result<(), EngineError> {
  let config = Config::from_env()?;

  let mut raw = String::new();
  io::stdin().lock().read_to_string(&mut raw)?;
  let change_set: ChangeSet = serde_json::from_str(&raw)?;

  let client = Arc::new(OpenAiClient::from_env(config.clone()));
  if !client.has_api_key() {
    warn!(env_var = %config.api_key_env, "no API key; summary and scores will be unavailable");
  }
  let engine = Engine::new(client.clone(), client);

  let runtime = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()
    .map_err(|e| EngineError::Runtime(e.to_string()))?;
  let report = runtime.block_on(engine.review(change_set.files));

  let json = serde_json::to_vec(&report)?;
  let mut stdout = io::stdout().lock();
  stdout.write_all(&json)?;
  stdout.flush()?;
  Ok(())
}
