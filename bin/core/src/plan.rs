use sqlx::PgPool;
use stackyard_client::{entities::plan::Plan, stackyard_timestamp};

use crate::{
  db, differ,
  differ::InstanceSpec,
  error::CoreError,
  identity::{self, configured_prefix},
  runtime::RuntimeDriver,
  token,
};

/// Computes a stack's plan: resolves its live instances, asks the
/// runtime what is actually running, and diffs the two. Never writes
/// anything — a plan can be computed any number of times without side
/// effects, and the token it returns is only meaningful as input to a
/// subsequent apply.
pub async fn plan(
  pool: &PgPool,
  runtime: &impl RuntimeDriver,
  stack_name: &str,
) -> Result<Plan, CoreError> {
  let prefix = configured_prefix();
  let stack = db::get_live_stack_by_name(pool, stack_name).await?;
  let instances = db::get_live_instances(pool, stack.id).await?;

  let mut desired = Vec::with_capacity(instances.len());
  let mut timestamps = Vec::with_capacity(instances.len());
  for instance in &instances {
    let template = db::get_template(pool, instance.template_service_id).await?;
    desired.push(InstanceSpec {
      instance_id: instance.instance_id.clone(),
      template_name: template.name,
      enabled: instance.enabled,
    });
    timestamps.push((instance.instance_id.clone(), instance.updated_at));
  }

  let label_filter = format!("{prefix}.stack_id={}", stack.id);
  let running_containers = runtime
    .list_containers_with_labels(&std::collections::BTreeMap::from([(
      format!("{prefix}.stack_id"),
      stack.id.to_string(),
    )]))
    .await
    .unwrap_or_else(|e| {
      tracing::warn!(
        "failed to list running containers for stack '{stack_name}' \
         (filter {label_filter}): {e:#}; treating as nothing running"
      );
      Vec::new()
    });

  let running: Vec<String> = running_containers
    .iter()
    .filter_map(|name| {
      identity::instance_id_from_container_name(prefix, stack_name, name)
        .map(str::to_string)
    })
    .collect();

  let changes = differ::diff(&desired, &running);
  let token = token::generate_token(stack.updated_at, &timestamps);

  Ok(Plan {
    stack_name: stack_name.to_string(),
    stack_id: stack.id,
    changes,
    token,
    generated_at: stackyard_timestamp(),
  })
}
