use serde::{Deserialize, Serialize};

use super::{
  ConfigFile, Dependency, Domain, EnvVar, Healthcheck, Label,
  PortMapping, RestartPolicy, VolumeMapping,
};

/// An immutable, reusable container spec. Created externally (e.g. by a
/// template catalog or an admin tool); the core only ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTemplate {
  pub id: i64,
  pub name: String,
  pub image_name: String,
  pub image_tag: String,
  #[serde(default)]
  pub restart_policy: RestartPolicy,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub command: Option<String>,
  #[serde(default)]
  pub ports: Vec<PortMapping>,
  #[serde(default)]
  pub volumes: Vec<VolumeMapping>,
  #[serde(default)]
  pub env_vars: Vec<EnvVar>,
  #[serde(default)]
  pub labels: Vec<Label>,
  #[serde(default)]
  pub domains: Vec<Domain>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub healthcheck: Option<Healthcheck>,
  #[serde(default)]
  pub dependencies: Vec<Dependency>,
  #[serde(default)]
  pub config_files: Vec<ConfigFile>,
  pub category: String,
}

impl ServiceTemplate {
  pub fn image(&self) -> String {
    format!("{}:{}", self.image_name, self.image_tag)
  }
}
