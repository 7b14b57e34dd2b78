use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;

/// Which OCI runtime CLI is driving container/network operations.
/// Selected once at process start by probing in priority order
/// (daemonless first).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RuntimeVariant {
  /// Rootless, daemonless OCI runtime (e.g. podman).
  Daemonless,
  /// Daemonful OCI runtime requiring a background service (e.g. docker).
  Daemonful,
}

impl RuntimeVariant {
  pub fn binary(self) -> &'static str {
    match self {
      RuntimeVariant::Daemonless => "podman",
      RuntimeVariant::Daemonful => "docker",
    }
  }

  /// Whether the runtime typically needs a privilege-elevation wrapper on
  /// this host.
  pub fn requires_elevation(self) -> bool {
    matches!(self, RuntimeVariant::Daemonful)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInspect {
  pub name: String,
  pub id: String,
  pub driver: String,
  #[serde(default)]
  pub labels: BTreeMap<String, String>,
  #[serde(default)]
  pub containers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NetworkStatus {
  Active {
    driver: String,
    containers: Vec<String>,
    labels: BTreeMap<String, String>,
  },
  NotCreated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkStatusResponse {
  pub network_name: String,
  #[serde(flatten)]
  pub status: NetworkStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeOutput {
  pub stdout: String,
  pub stderr: String,
  pub exit_code: i32,
}

impl ComposeOutput {
  pub fn success(&self) -> bool {
    self.exit_code == 0
  }

  pub fn combined(&self) -> String {
    if self.stderr.is_empty() {
      self.stdout.clone()
    } else {
      format!("{}\n{}", self.stdout, self.stderr)
    }
  }
}
