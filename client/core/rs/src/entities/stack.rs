use serde::{Deserialize, Serialize};

use super::Timestamp;

/// A named group of service instances sharing one isolated bridge network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stack {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub network_name: String,
  pub enabled: bool,
  pub created_at: Timestamp,
  pub updated_at: Timestamp,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deleted_at: Option<Timestamp>,
}

impl Stack {
  pub fn is_live(&self) -> bool {
    self.deleted_at.is_none()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackListItem {
  pub id: i64,
  pub name: String,
  pub enabled: bool,
  pub network_name: String,
}
