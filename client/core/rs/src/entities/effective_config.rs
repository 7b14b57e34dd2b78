use serde::{Deserialize, Serialize};

use super::{
  ConfigFile, Dependency, Domain, EnvVar, Healthcheck, Label,
  PortMapping, RestartPolicy, VolumeMapping,
};
use super::instance::OverridesApplied;

/// The fully merged, identity-labeled, ready-to-deploy spec for one
/// instance. Resolved on demand, never persisted. Canonical input to the
/// deployment-document generator and to the `/effective` read endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
  pub stack_id: i64,
  pub instance_id: String,
  pub template_service_id: i64,
  pub container_name: String,
  pub network_name: String,
  pub image_name: String,
  pub image_tag: String,
  pub restart_policy: RestartPolicy,
  pub command: Option<String>,
  pub ports: Vec<PortMapping>,
  pub volumes: Vec<VolumeMapping>,
  pub env_vars: Vec<EnvVar>,
  pub labels: Vec<Label>,
  pub domains: Vec<Domain>,
  pub healthcheck: Option<Healthcheck>,
  pub dependencies: Vec<Dependency>,
  pub config_files: Vec<ConfigFile>,
  pub overrides_applied: OverridesApplied,
}

impl EffectiveConfig {
  pub fn image(&self) -> String {
    format!("{}:{}", self.image_name, self.image_tag)
  }

  /// Serializable view with secret env values masked. Every consumer
  /// except the apply pipeline must use this instead of serializing the
  /// struct directly.
  pub fn redacted(&self) -> EffectiveConfig {
    let mut copy = self.clone();
    for env in &mut copy.env_vars {
      if env.is_secret {
        env.value = env.value.as_ref().map(|_| "*****".to_string());
      }
    }
    copy
  }
}
