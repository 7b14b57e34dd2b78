pub mod effective_config;
pub mod instance;
pub mod plan;
pub mod runtime;
pub mod stack;
pub mod template;

use serde::{Deserialize, Serialize};

/// `hostIp:hostPort:containerPort/proto`, the shape ports are formatted
/// into for the deployment document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub host_ip: Option<String>,
  pub host_port: u16,
  pub container_port: u16,
  #[serde(default)]
  pub protocol: Protocol,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
  #[default]
  Tcp,
  Udp,
}

impl std::fmt::Display for Protocol {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Protocol::Tcp => write!(f, "tcp"),
      Protocol::Udp => write!(f, "udp"),
    }
  }
}

/// `src:dst[:ro]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMapping {
  pub source: String,
  pub target: String,
  #[serde(default)]
  pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
  pub key: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<String>,
  #[serde(default)]
  pub is_secret: bool,
}

impl EnvVar {
  /// Masks the value if secret, unless `reveal` (the apply pipeline) is set.
  pub fn display_value(&self, reveal: bool) -> Option<String> {
    if self.is_secret && !reveal {
      self.value.as_ref().map(|_| "*****".to_string())
    } else {
      self.value.clone()
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
  pub key: String,
  pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
  pub domain: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub proxy_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Healthcheck {
  pub test: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interval: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub retries: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start_period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
  pub depends_on: String,
  #[serde(default)]
  pub condition: DependsOnCondition,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DependsOnCondition {
  #[default]
  ServiceStarted,
  ServiceHealthy,
  ServiceCompletedSuccessfully,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
  /// Relative path, joined onto the stack/instance's materialization
  /// directory.
  pub file_path: String,
  pub content: String,
  /// Unix file mode, e.g. `0o644`. Defaults to `0o644` when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file_mode: Option<u32>,
}

impl ConfigFile {
  pub fn mode(&self) -> u32 {
    self.file_mode.unwrap_or(0o644)
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
  No,
  #[default]
  Always,
  OnFailure,
  UnlessStopped,
}

impl std::fmt::Display for RestartPolicy {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let s = match self {
      RestartPolicy::No => "no",
      RestartPolicy::Always => "always",
      RestartPolicy::OnFailure => "on-failure",
      RestartPolicy::UnlessStopped => "unless-stopped",
    };
    write!(f, "{s}")
  }
}

pub type Timestamp = i64;
