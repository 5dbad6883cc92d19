//! Heuristic suggestions for a whole change set.

use tracing::debug;

use crate::diff;
use crate::metrics;
use crate::readability;
use crate::types::{FileChange, PatchLine, Suggestion};

/// Readability suggestions for every file, then metric suggestions for every
/// file, each pass in input order. Files without a patch are skipped.
///
/// Uses `lines` when the parser already populated them, otherwise parses the
/// patch on the fly.
pub fn aggregate(files: &[FileChange]) -> Vec<Suggestion> {
  let parsed: Vec<(&str, Vec<PatchLine>)> = files
    .iter()
    .filter(|f| f.has_patch())
    .map(|f| {
      let lines = if f.lines.is_empty() {
        diff::parse(f.patch.as_deref().unwrap_or_default())
      } else {
        f.lines.clone()
      };
      (f.filename.as_str(), lines)
    })
    .collect();

  let mut out: Vec<Suggestion> = parsed
    .iter()
    .flat_map(|(name, lines)| readability::scan(name, lines))
    .collect();
  let readability_count = out.len();

  out.extend(
    parsed
      .iter()
      .flat_map(|(name, lines)| metrics::analyze(name, lines)),
  );

  debug!(
    files = parsed.len(),
    readability = readability_count,
    metrics = out.len() - readability_count,
    "suggestions aggregated"
  );
  out
}
