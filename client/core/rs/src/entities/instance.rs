use serde::{Deserialize, Serialize};

use super::{
  ConfigFile, Dependency, Domain, EnvVar, Healthcheck, Label,
  PortMapping, RestartPolicy, Timestamp, VolumeMapping,
};

/// A per-stack occurrence of a template, optionally customized via
/// [`InstanceOverrides`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInstance {
  pub id: i64,
  pub stack_id: i64,
  /// Unique within the stack. Used verbatim in the computed container name.
  pub instance_id: String,
  pub template_service_id: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub enabled: bool,
  /// Computed deterministically at creation time from the stack name and
  /// this instance id; `None` only transiently before the row is
  /// persisted.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub container_name: Option<String>,
  pub created_at: Timestamp,
  pub updated_at: Timestamp,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deleted_at: Option<Timestamp>,

  // Scalar overrides: plain per-instance replacements, distinct from the
  // list-of-records override categories below.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_name_override: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_tag_override: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub restart_policy_override: Option<RestartPolicy>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub command_override: Option<String>,
}

impl ServiceInstance {
  pub fn is_live(&self) -> bool {
    self.deleted_at.is_none()
  }
}

/// The override rows attached to one instance. A category is "applied"
/// when its `Vec` is non-empty (or, for `healthcheck`, `Some`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceOverrides {
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
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OverrideCategory {
  Ports,
  Volumes,
  EnvVars,
  Labels,
  Domains,
  Healthcheck,
  Dependencies,
  ConfigFiles,
}

/// Which override categories were actually applied for one instance's
/// resolution. Used for UI highlighting / diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverridesApplied(pub Vec<OverrideCategory>);

impl OverridesApplied {
  pub fn from_overrides(overrides: &InstanceOverrides) -> Self {
    let mut applied = Vec::new();
    if !overrides.ports.is_empty() {
      applied.push(OverrideCategory::Ports);
    }
    if !overrides.volumes.is_empty() {
      applied.push(OverrideCategory::Volumes);
    }
    if !overrides.env_vars.is_empty() {
      applied.push(OverrideCategory::EnvVars);
    }
    if !overrides.labels.is_empty() {
      applied.push(OverrideCategory::Labels);
    }
    if !overrides.domains.is_empty() {
      applied.push(OverrideCategory::Domains);
    }
    if overrides.healthcheck.is_some() {
      applied.push(OverrideCategory::Healthcheck);
    }
    if !overrides.dependencies.is_empty() {
      applied.push(OverrideCategory::Dependencies);
    }
    if !overrides.config_files.is_empty() {
      applied.push(OverrideCategory::ConfigFiles);
    }
    Self(applied)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
