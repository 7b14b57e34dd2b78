use indexmap::IndexMap;
use serde::Serialize;
use stackyard_client::entities::effective_config::EffectiveConfig;

/// A declarative deployment document: a `services` map keyed by instance
/// id, and a top-level `networks` map declaring the stack's network as
/// external. Serializes to the runtime's compose YAML shape.
#[derive(Debug, Serialize)]
pub struct ComposeDocument {
  pub services: IndexMap<String, ComposeService>,
  pub networks: IndexMap<String, ComposeNetwork>,
}

#[derive(Debug, Serialize)]
pub struct ComposeService {
  pub image: String,
  pub container_name: String,
  pub restart: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub command: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub ports: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub volumes: Vec<String>,
  #[serde(skip_serializing_if = "IndexMap::is_empty")]
  pub environment: IndexMap<String, String>,
  #[serde(skip_serializing_if = "IndexMap::is_empty")]
  pub labels: IndexMap<String, String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub depends_on: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub healthcheck: Option<ComposeHealthcheck>,
  pub networks: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ComposeHealthcheck {
  pub test: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub interval: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub retries: Option<u32>,
  #[serde(rename = "start_period", skip_serializing_if = "Option::is_none")]
  pub start_period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ComposeNetwork {
  pub external: bool,
}

/// Emits the deployment document for every enabled instance's effective
/// config. Disabled instances are never materialized into the document —
/// the differ's `modify` change is what removes their running container.
pub fn generate(
  network_name: &str,
  configs: &[EffectiveConfig],
) -> ComposeDocument {
  let mut services = IndexMap::new();

  for config in configs {
    let ports = config
      .ports
      .iter()
      .map(|p| {
        let host_ip = p
          .host_ip
          .as_deref()
          .map(|ip| format!("{ip}:"))
          .unwrap_or_default();
        format!(
          "{host_ip}{}:{}/{}",
          p.host_port, p.container_port, p.protocol
        )
      })
      .collect();

    let volumes = config
      .volumes
      .iter()
      .map(|v| {
        if v.read_only {
          format!("{}:{}:ro", v.source, v.target)
        } else {
          format!("{}:{}", v.source, v.target)
        }
      })
      .collect();

    let environment = config
      .env_vars
      .iter()
      .map(|e| {
        (e.key.clone(), e.display_value(true).unwrap_or_default())
      })
      .collect();

    let labels = config
      .labels
      .iter()
      .map(|l| (l.key.clone(), l.value.clone()))
      .collect();

    let depends_on = config
      .dependencies
      .iter()
      .map(|d| d.depends_on.clone())
      .collect();

    let healthcheck = config.healthcheck.as_ref().map(|h| ComposeHealthcheck {
      test: h.test.clone(),
      interval: h.interval.clone(),
      timeout: h.timeout.clone(),
      retries: h.retries,
      start_period: h.start_period.clone(),
    });

    services.insert(
      config.instance_id.clone(),
      ComposeService {
        image: config.image(),
        container_name: config.container_name.clone(),
        restart: config.restart_policy.to_string(),
        command: config.command.clone(),
        ports,
        volumes,
        environment,
        labels,
        depends_on,
        healthcheck,
        networks: vec![network_name.to_string()],
      },
    );
  }

  let mut networks = IndexMap::new();
  networks.insert(network_name.to_string(), ComposeNetwork { external: true });

  ComposeDocument { services, networks }
}

pub fn to_yaml(document: &ComposeDocument) -> anyhow::Result<String> {
  serde_yaml_ng::to_string(document)
    .map_err(|e| anyhow::anyhow!("failed to serialize compose document: {e:#}"))
}

#[cfg(test)]
mod tests {
  use stackyard_client::entities::{
    PortMapping, RestartPolicy, instance::OverridesApplied,
  };

  use super::*;

  fn config() -> EffectiveConfig {
    EffectiveConfig {
      stack_id: 1,
      instance_id: "api".into(),
      template_service_id: 1,
      container_name: "sy-web-api".into(),
      network_name: "sy-web-net".into(),
      image_name: "nginx".into(),
      image_tag: "latest".into(),
      restart_policy: RestartPolicy::Always,
      command: None,
      ports: vec![PortMapping {
        host_ip: None,
        host_port: 8080,
        container_port: 80,
        protocol: Default::default(),
      }],
      volumes: Vec::new(),
      env_vars: Vec::new(),
      labels: Vec::new(),
      domains: Vec::new(),
      healthcheck: None,
      dependencies: Vec::new(),
      config_files: Vec::new(),
      overrides_applied: OverridesApplied::default(),
    }
  }

  #[test]
  fn generates_one_service_per_instance() {
    let doc = generate("sy-web-net", &[config()]);
    assert_eq!(doc.services.len(), 1);
    assert!(doc.services.contains_key("api"));
    assert!(doc.networks.contains_key("sy-web-net"));
    assert!(doc.networks["sy-web-net"].external);
  }

  #[test]
  fn port_formatting_includes_protocol() {
    let doc = generate("sy-web-net", &[config()]);
    assert_eq!(doc.services["api"].ports, vec!["8080:80/tcp"]);
  }

  #[test]
  fn serializes_to_yaml() {
    let doc = generate("sy-web-net", &[config()]);
    let yaml = to_yaml(&doc).unwrap();
    assert!(yaml.contains("services"));
    assert!(yaml.contains("external: true"));
  }
}
