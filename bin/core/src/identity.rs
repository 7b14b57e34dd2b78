use std::collections::BTreeMap;

use validations::{StringValidator, StringValidatorMatches};

use crate::{config::app_config, error::CoreError};

const CONTAINER_NAME_MAX: usize = 127;
const NETWORK_NAME_MAX: usize = 63;

/// Every identity label lives under this reserved key namespace; user
/// overrides may never shadow it.
pub fn reserved_label_prefix(prefix: &str) -> String {
  format!("{prefix}.")
}

pub fn is_reserved_label_key(prefix: &str, key: &str) -> bool {
  key.starts_with(&reserved_label_prefix(prefix))
}

pub fn container_name(
  prefix: &str,
  stack_name: &str,
  instance_id: &str,
) -> String {
  format!("{prefix}-{stack_name}-{instance_id}")
}

pub fn network_name(prefix: &str, stack_name: &str) -> String {
  format!("{prefix}-{stack_name}-net")
}

pub fn compose_project_name(prefix: &str, stack_name: &str) -> String {
  format!("{prefix}-{stack_name}")
}

fn name_character_validator(max_length: usize) -> StringValidator {
  StringValidator::default()
    .min_length(1)
    .max_length(max_length)
    .matches(StringValidatorMatches::ResourceName)
}

/// Fails early, at creation time, naming both the offending stack and
/// instance when the computed container name exceeds the length ceiling.
pub fn validate_container_name(
  prefix: &str,
  stack_name: &str,
  instance_id: &str,
) -> Result<(), CoreError> {
  let name = container_name(prefix, stack_name, instance_id);
  name_character_validator(CONTAINER_NAME_MAX)
    .validate(&name)
    .map_err(|e| {
      CoreError::Validation(format!(
        "stack '{stack_name}', instance '{instance_id}': computed \
         container name '{name}' is invalid ({e:#}); container names \
         must be at most {CONTAINER_NAME_MAX} characters"
      ))
    })
}

pub fn validate_network_name(
  prefix: &str,
  stack_name: &str,
) -> Result<(), CoreError> {
  let name = network_name(prefix, stack_name);
  name_character_validator(NETWORK_NAME_MAX).validate(&name).map_err(
    |e| {
      CoreError::Validation(format!(
        "stack '{stack_name}': computed network name '{name}' is \
         invalid ({e:#}); network names must be at most \
         {NETWORK_NAME_MAX} characters"
      ))
    },
  )
}

/// The fixed identity label set. Reserved keys are always written by
/// this component; any caller-supplied label under the reserved prefix
/// must be rejected before reaching here (see [`reject_reserved_overrides`]).
pub fn build_identity_labels(
  prefix: &str,
  stack_id: i64,
  instance_id: &str,
  template_service_id: i64,
) -> BTreeMap<String, String> {
  BTreeMap::from([
    (format!("{prefix}.stack_id"), stack_id.to_string()),
    (format!("{prefix}.instance_id"), instance_id.to_string()),
    (
      format!("{prefix}.template_service_id"),
      template_service_id.to_string(),
    ),
    (format!("{prefix}.managed_by"), prefix.to_string()),
    (
      format!("{prefix}.version"),
      env!("CARGO_PKG_VERSION").to_string(),
    ),
  ])
}

/// Labels attached to the stack's shared network. Narrower than
/// [`build_identity_labels`] since a network isn't owned by one instance.
pub fn build_network_labels(
  prefix: &str,
  stack_id: i64,
) -> BTreeMap<String, String> {
  BTreeMap::from([
    (format!("{prefix}.stack_id"), stack_id.to_string()),
    (format!("{prefix}.managed_by"), prefix.to_string()),
  ])
}

/// Rejects any user-supplied label whose key falls under the reserved
/// prefix. The historical leniency of letting overrides win over
/// identity labels is not implemented here; reserved keys are always
/// owned by this component.
pub fn reject_reserved_overrides(
  prefix: &str,
  labels: &[stackyard_client::entities::Label],
) -> Result<(), CoreError> {
  for label in labels {
    if is_reserved_label_key(prefix, &label.key) {
      return Err(CoreError::Validation(format!(
        "label key '{}' is reserved and cannot be set by an override",
        label.key
      )));
    }
  }
  Ok(())
}

pub fn configured_prefix() -> &'static str {
  &app_config().name_prefix
}

/// Recovers `instance_id` from a container name the runtime reports,
/// given the same `(prefix, stack_name)` pair [`container_name`] was
/// built from. Names that don't carry the expected prefix are skipped by
/// the caller rather than guessed at.
pub fn instance_id_from_container_name<'a>(
  prefix: &str,
  stack_name: &str,
  name: &'a str,
) -> Option<&'a str> {
  let own_prefix = format!("{prefix}-{stack_name}-");
  name.strip_prefix(own_prefix.as_str())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn container_name_is_deterministic() {
    assert_eq!(container_name("sy", "web", "api"), "sy-web-api");
  }

  #[test]
  fn network_name_is_deterministic() {
    assert_eq!(network_name("sy", "web"), "sy-web-net");
  }

  #[test]
  fn rejects_overlong_container_name() {
    let stack = "a".repeat(200);
    assert!(validate_container_name("sy", &stack, "api").is_err());
  }

  #[test]
  fn rejects_bad_characters() {
    assert!(validate_container_name("sy", "web/evil", "api").is_err());
  }

  #[test]
  fn accepts_boundary_length_and_rejects_one_more() {
    // prefix "sy", joiners "--" cost 2 chars, instance id "api" costs 3.
    let overhead = "sy--api".len();
    let max_stack_len = CONTAINER_NAME_MAX - overhead;
    let ok_stack = "a".repeat(max_stack_len);
    let too_long_stack = "a".repeat(max_stack_len + 1);
    assert!(validate_container_name("sy", &ok_stack, "api").is_ok());
    assert!(
      validate_container_name("sy", &too_long_stack, "api").is_err()
    );
  }

  #[test]
  fn reserved_label_detection() {
    assert!(is_reserved_label_key("sy", "sy.stack_id"));
    assert!(!is_reserved_label_key("sy", "com.example.foo"));
  }

  #[test]
  fn network_labels_carry_stack_id_only() {
    let labels = build_network_labels("sy", 42);
    assert_eq!(labels.len(), 2);
    assert_eq!(labels.get("sy.stack_id").map(String::as_str), Some("42"));
  }

  #[test]
  fn recovers_instance_id_from_container_name() {
    assert_eq!(
      instance_id_from_container_name("sy", "web", "sy-web-api"),
      Some("api")
    );
    assert_eq!(
      instance_id_from_container_name("sy", "web", "other-thing"),
      None
    );
  }

  #[test]
  fn build_identity_labels_has_fixed_keys() {
    let labels = build_identity_labels("sy", 42, "api", 7);
    assert_eq!(labels.get("sy.stack_id").map(String::as_str), Some("42"));
    assert_eq!(
      labels.get("sy.instance_id").map(String::as_str),
      Some("api")
    );
    assert_eq!(
      labels.get("sy.template_service_id").map(String::as_str),
      Some("7")
    );
    assert_eq!(
      labels.get("sy.managed_by").map(String::as_str),
      Some("sy")
    );
    assert!(labels.contains_key("sy.version"));
  }
}
