use serde::{Deserialize, Serialize};

/// One row of the per-user plan-generation log, newest rows first on read
///
/// `params` is stored as JSON text and decoded leniently: a corrupt blob
/// reads back as an empty map rather than failing the fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
  /// UTC timestamp, ISO-8601 with second precision
  pub dt: String,

  /// Entry kind; the extractor only looks at `"plan"` rows
  #[serde(rename = "type")]
  pub entry_type: String,

  /// The request parameters that produced this entry
  pub params: serde_json::Value,

  /// Resulting plan text
  pub plan: String,
}

/// A coach-saved plan template, keyed by (user, name)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
  pub name: String,
  pub plan: String,
  pub params: serde_json::Value,
  pub created: String,
}
