use stackyard_client::entities::{
  effective_config::EffectiveConfig,
  instance::{InstanceOverrides, OverridesApplied, ServiceInstance},
  stack::Stack,
  template::ServiceTemplate,
};

use crate::identity::{build_identity_labels, container_name, is_reserved_label_key};

/// Merges a template, an instance's overrides, and identity labels into
/// a single fully-resolved spec. Scalar fields take the override when
/// present, otherwise the template value; list-of-records fields replace
/// wholesale when the instance has any row in that category, otherwise
/// the template list is used as-is. Identity labels are always merged on
/// top, last, and reserved keys always win.
pub fn resolve(
  prefix: &str,
  stack: &Stack,
  instance: &ServiceInstance,
  template: &ServiceTemplate,
  overrides: &InstanceOverrides,
) -> EffectiveConfig {
  let container_name =
    container_name(prefix, &stack.name, &instance.instance_id);

  let mut labels = if overrides.labels.is_empty() {
    template.labels.clone()
  } else {
    overrides.labels.clone()
  };
  // User overrides may not shadow reserved keys; the validator at the
  // API boundary already rejects such input, but resolution itself must
  // never emit a stale/duplicate reserved entry either.
  labels.retain(|label| !is_reserved_label_key(prefix, &label.key));
  let identity = build_identity_labels(
    prefix,
    stack.id,
    &instance.instance_id,
    template.id,
  );
  for (key, value) in identity {
    labels.push(stackyard_client::entities::Label { key, value });
  }

  EffectiveConfig {
    stack_id: stack.id,
    instance_id: instance.instance_id.clone(),
    template_service_id: template.id,
    container_name,
    network_name: stack.network_name.clone(),
    image_name: instance
      .image_name_override
      .clone()
      .unwrap_or_else(|| template.image_name.clone()),
    image_tag: instance
      .image_tag_override
      .clone()
      .unwrap_or_else(|| template.image_tag.clone()),
    restart_policy: instance
      .restart_policy_override
      .unwrap_or(template.restart_policy),
    command: instance
      .command_override
      .clone()
      .or_else(|| template.command.clone()),
    ports: if overrides.ports.is_empty() {
      template.ports.clone()
    } else {
      overrides.ports.clone()
    },
    volumes: if overrides.volumes.is_empty() {
      template.volumes.clone()
    } else {
      overrides.volumes.clone()
    },
    env_vars: if overrides.env_vars.is_empty() {
      template.env_vars.clone()
    } else {
      overrides.env_vars.clone()
    },
    labels,
    domains: if overrides.domains.is_empty() {
      template.domains.clone()
    } else {
      overrides.domains.clone()
    },
    healthcheck: overrides
      .healthcheck
      .clone()
      .or_else(|| template.healthcheck.clone()),
    dependencies: if overrides.dependencies.is_empty() {
      template.dependencies.clone()
    } else {
      overrides.dependencies.clone()
    },
    config_files: if overrides.config_files.is_empty() {
      template.config_files.clone()
    } else {
      overrides.config_files.clone()
    },
    overrides_applied: OverridesApplied::from_overrides(overrides),
  }
}

#[cfg(test)]
mod tests {
  use stackyard_client::entities::{Label, RestartPolicy};

  use super::*;

  fn stack() -> Stack {
    Stack {
      id: 42,
      name: "web".into(),
      description: String::new(),
      network_name: "sy-web-net".into(),
      enabled: true,
      created_at: 0,
      updated_at: 0,
      deleted_at: None,
    }
  }

  fn instance() -> ServiceInstance {
    ServiceInstance {
      id: 1,
      stack_id: 42,
      instance_id: "api".into(),
      template_service_id: 7,
      description: None,
      enabled: true,
      container_name: None,
      created_at: 0,
      updated_at: 0,
      deleted_at: None,
      image_name_override: None,
      image_tag_override: None,
      restart_policy_override: None,
      command_override: None,
    }
  }

  fn template() -> ServiceTemplate {
    ServiceTemplate {
      id: 7,
      name: "nginx".into(),
      image_name: "nginx".into(),
      image_tag: "latest".into(),
      restart_policy: RestartPolicy::Always,
      command: None,
      ports: Vec::new(),
      volumes: Vec::new(),
      env_vars: Vec::new(),
      labels: vec![Label {
        key: "team".into(),
        value: "platform".into(),
      }],
      domains: Vec::new(),
      healthcheck: None,
      dependencies: Vec::new(),
      config_files: Vec::new(),
      category: "web".into(),
    }
  }

  #[test]
  fn empty_overrides_yield_empty_overrides_applied() {
    let config = resolve(
      "sy",
      &stack(),
      &instance(),
      &template(),
      &InstanceOverrides::default(),
    );
    assert!(config.overrides_applied.is_empty());
    assert_eq!(config.container_name, "sy-web-api");
    assert_eq!(config.image(), "nginx:latest");
  }

  #[test]
  fn template_labels_survive_alongside_identity_labels() {
    let config = resolve(
      "sy",
      &stack(),
      &instance(),
      &template(),
      &InstanceOverrides::default(),
    );
    assert!(config.labels.iter().any(|l| l.key == "team"));
    assert!(config.labels.iter().any(|l| l.key == "sy.stack_id"));
  }

  #[test]
  fn port_override_replaces_template_list_entirely() {
    let overrides = InstanceOverrides {
      ports: vec![stackyard_client::entities::PortMapping {
        host_ip: None,
        host_port: 8080,
        container_port: 80,
        protocol: Default::default(),
      }],
      ..Default::default()
    };
    let config =
      resolve("sy", &stack(), &instance(), &template(), &overrides);
    assert_eq!(config.ports.len(), 1);
    assert_eq!(
      config.overrides_applied.0,
      vec![stackyard_client::entities::instance::OverrideCategory::Ports]
    );
  }

  #[test]
  fn scalar_override_replaces_template_value() {
    let mut inst = instance();
    inst.image_tag_override = Some("1.25".into());
    let config = resolve(
      "sy",
      &stack(),
      &inst,
      &template(),
      &InstanceOverrides::default(),
    );
    assert_eq!(config.image_tag, "1.25");
  }
}
