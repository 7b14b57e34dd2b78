use std::collections::BTreeMap;

use serde_json::json;
use stackyard_client::entities::plan::{Change, ChangeAction, ChangeSource, FieldChange};

/// The minimal desired-state projection the differ needs — computed
/// separately from the full effective config so the differ itself stays
/// a pure function of plain data.
#[derive(Debug, Clone)]
pub struct InstanceSpec {
  pub instance_id: String,
  pub template_name: String,
  pub enabled: bool,
}

/// Pure stateless diff: `(desired, running) -> changes`, ordered
/// remove → modify → add, ties broken by `instance_id` ascending. This
/// ordering lets removed resources free names before additions claim
/// them.
pub fn diff(
  desired: &[InstanceSpec],
  running: &[String],
) -> Vec<Change> {
  let desired_by_id: BTreeMap<&str, &InstanceSpec> = desired
    .iter()
    .map(|spec| (spec.instance_id.as_str(), spec))
    .collect();
  let running_set: std::collections::BTreeSet<&str> =
    running.iter().map(String::as_str).collect();

  let mut removes = Vec::new();
  let mut modifies = Vec::new();
  let mut adds = Vec::new();

  for name in &running_set {
    if !desired_by_id.contains_key(name) {
      removes.push(Change {
        action: ChangeAction::Remove,
        instance_id: name.to_string(),
        template_name: None,
        source: ChangeSource::Runtime,
        fields: None,
      });
    }
  }

  let mut sorted_desired = desired.to_vec();
  sorted_desired
    .sort_by(|a, b| a.instance_id.cmp(&b.instance_id));

  for spec in &sorted_desired {
    let is_running = running_set.contains(spec.instance_id.as_str());
    if is_running && !spec.enabled {
      let mut fields = BTreeMap::new();
      fields.insert(
        "enabled".to_string(),
        FieldChange { old: json!(true), new: json!(false) },
      );
      modifies.push(Change {
        action: ChangeAction::Modify,
        instance_id: spec.instance_id.clone(),
        template_name: Some(spec.template_name.clone()),
        source: ChangeSource::Db,
        fields: Some(fields),
      });
    } else if spec.enabled && !is_running {
      adds.push(Change {
        action: ChangeAction::Add,
        instance_id: spec.instance_id.clone(),
        template_name: Some(spec.template_name.clone()),
        source: ChangeSource::Db,
        fields: None,
      });
    }
  }

  removes.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));

  removes.into_iter().chain(modifies).chain(adds).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn spec(id: &str, enabled: bool) -> InstanceSpec {
    InstanceSpec {
      instance_id: id.to_string(),
      template_name: "nginx".to_string(),
      enabled,
    }
  }

  #[test]
  fn fresh_apply_is_all_adds() {
    let changes = diff(&[spec("api", true)], &[]);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].action, ChangeAction::Add);
  }

  #[test]
  fn no_op_when_desired_matches_running() {
    let changes = diff(&[spec("api", true)], &["api".to_string()]);
    assert!(changes.is_empty());
  }

  #[test]
  fn disable_produces_modify() {
    let changes = diff(&[spec("api", false)], &["api".to_string()]);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].action, ChangeAction::Modify);
    let fields = changes[0].fields.as_ref().unwrap();
    assert_eq!(fields["enabled"].old, json!(true));
    assert_eq!(fields["enabled"].new, json!(false));
  }

  #[test]
  fn absent_from_desired_produces_remove() {
    let changes = diff(&[], &["orphan".to_string()]);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].action, ChangeAction::Remove);
    assert_eq!(changes[0].source, ChangeSource::Runtime);
  }

  #[test]
  fn ordering_is_remove_then_modify_then_add() {
    let changes = diff(
      &[spec("b", false), spec("c", true)],
      &["a".to_string(), "b".to_string()],
    );
    let actions: Vec<_> = changes.iter().map(|c| c.action).collect();
    assert_eq!(
      actions,
      vec![ChangeAction::Remove, ChangeAction::Modify, ChangeAction::Add]
    );
  }

  #[test]
  fn is_pure() {
    let desired = [spec("api", true), spec("db", false)];
    let running = ["db".to_string(), "orphan".to_string()];
    assert_eq!(diff(&desired, &running), diff(&desired, &running));
  }

  #[test]
  fn disabled_instance_not_yet_running_produces_no_change() {
    let changes = diff(&[spec("api", false)], &[]);
    assert!(changes.is_empty());
  }
}
