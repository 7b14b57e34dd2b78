use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;

use super::Timestamp;

/// An ephemeral description of (desired - actual) for one stack, plus a
/// staleness token. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
  pub stack_name: String,
  pub stack_id: i64,
  pub changes: Vec<Change>,
  pub token: String,
  pub generated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
  pub action: ChangeAction,
  pub instance_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub template_name: Option<String>,
  pub source: ChangeSource,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fields: Option<BTreeMap<String, FieldChange>>,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChangeAction {
  Add,
  Remove,
  Modify,
}

/// `"db"` for desired-derived changes, `"runtime"` for running-only.
/// Other values are reserved for future extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
  Db,
  Runtime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
  pub old: serde_json::Value,
  pub new: serde_json::Value,
}
