use sqlx::{PgPool, Row, types::Json};
use stackyard_client::entities::{
  ConfigFile, Dependency, Domain, EnvVar, Healthcheck, Label,
  PortMapping, RestartPolicy, VolumeMapping,
  instance::{InstanceOverrides, ServiceInstance},
  stack::Stack,
  template::ServiceTemplate,
};

use crate::error::CoreError;

fn internal(e: sqlx::Error) -> CoreError {
  CoreError::Internal(e.into())
}

fn stack_from_row(row: &sqlx::postgres::PgRow) -> Result<Stack, CoreError> {
  Ok(Stack {
    id: row.try_get("id").map_err(internal)?,
    name: row.try_get("name").map_err(internal)?,
    description: row.try_get("description").map_err(internal)?,
    network_name: row.try_get("network_name").map_err(internal)?,
    enabled: row.try_get("enabled").map_err(internal)?,
    created_at: row.try_get("created_at").map_err(internal)?,
    updated_at: row.try_get("updated_at").map_err(internal)?,
    deleted_at: row.try_get("deleted_at").map_err(internal)?,
  })
}

/// Fetches a live (non-soft-deleted) stack by name. Soft-deleted and
/// absent stacks are both reported as not-found — neither is visible to
/// plan/apply.
pub async fn get_live_stack_by_name(
  pool: &PgPool,
  name: &str,
) -> Result<Stack, CoreError> {
  let row = sqlx::query(
    "SELECT id, name, description, network_name, enabled, \
     created_at, updated_at, deleted_at FROM stacks \
     WHERE name = $1 AND deleted_at IS NULL",
  )
  .bind(name)
  .fetch_optional(pool)
  .await
  .map_err(internal)?
  .ok_or_else(|| {
    CoreError::NotFound(format!("stack '{name}' not found"))
  })?;
  stack_from_row(&row)
}

/// All non-soft-deleted instances of a stack, including disabled ones,
/// ordered by `instance_id` ascending (the ordering the token and differ
/// both require).
pub async fn get_live_instances(
  pool: &PgPool,
  stack_id: i64,
) -> Result<Vec<ServiceInstance>, CoreError> {
  let rows = sqlx::query(
    "SELECT id, stack_id, instance_id, template_service_id, \
     description, enabled, container_name, created_at, updated_at, \
     deleted_at, image_name_override, image_tag_override, \
     restart_policy_override, command_override FROM service_instances \
     WHERE stack_id = $1 AND deleted_at IS NULL \
     ORDER BY instance_id ASC",
  )
  .bind(stack_id)
  .fetch_all(pool)
  .await
  .map_err(internal)?;

  rows
    .iter()
    .map(|row| {
      Ok(ServiceInstance {
        id: row.try_get("id").map_err(internal)?,
        stack_id: row.try_get("stack_id").map_err(internal)?,
        instance_id: row.try_get("instance_id").map_err(internal)?,
        template_service_id: row
          .try_get("template_service_id")
          .map_err(internal)?,
        description: row.try_get("description").map_err(internal)?,
        enabled: row.try_get("enabled").map_err(internal)?,
        container_name: row
          .try_get("container_name")
          .map_err(internal)?,
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
        deleted_at: row.try_get("deleted_at").map_err(internal)?,
        image_name_override: row
          .try_get("image_name_override")
          .map_err(internal)?,
        image_tag_override: row
          .try_get("image_tag_override")
          .map_err(internal)?,
        restart_policy_override: row
          .try_get::<Option<Json<RestartPolicy>>, _>(
            "restart_policy_override",
          )
          .map_err(internal)?
          .map(|Json(v)| v),
        command_override: row
          .try_get("command_override")
          .map_err(internal)?,
      })
    })
    .collect()
}

/// Fetches one live instance by its stack-scoped `instance_id`.
pub async fn get_live_instance(
  pool: &PgPool,
  stack_id: i64,
  instance_id: &str,
) -> Result<ServiceInstance, CoreError> {
  let row = sqlx::query(
    "SELECT id, stack_id, instance_id, template_service_id, \
     description, enabled, container_name, created_at, updated_at, \
     deleted_at, image_name_override, image_tag_override, \
     restart_policy_override, command_override FROM service_instances \
     WHERE stack_id = $1 AND instance_id = $2 AND deleted_at IS NULL",
  )
  .bind(stack_id)
  .bind(instance_id)
  .fetch_optional(pool)
  .await
  .map_err(internal)?
  .ok_or_else(|| {
    CoreError::NotFound(format!(
      "instance '{instance_id}' not found in stack"
    ))
  })?;

  Ok(ServiceInstance {
    id: row.try_get("id").map_err(internal)?,
    stack_id: row.try_get("stack_id").map_err(internal)?,
    instance_id: row.try_get("instance_id").map_err(internal)?,
    template_service_id: row
      .try_get("template_service_id")
      .map_err(internal)?,
    description: row.try_get("description").map_err(internal)?,
    enabled: row.try_get("enabled").map_err(internal)?,
    container_name: row.try_get("container_name").map_err(internal)?,
    created_at: row.try_get("created_at").map_err(internal)?,
    updated_at: row.try_get("updated_at").map_err(internal)?,
    deleted_at: row.try_get("deleted_at").map_err(internal)?,
    image_name_override: row
      .try_get("image_name_override")
      .map_err(internal)?,
    image_tag_override: row
      .try_get("image_tag_override")
      .map_err(internal)?,
    restart_policy_override: row
      .try_get::<Option<Json<RestartPolicy>>, _>(
        "restart_policy_override",
      )
      .map_err(internal)?
      .map(|Json(v)| v),
    command_override: row.try_get("command_override").map_err(internal)?,
  })
}

pub async fn get_template(
  pool: &PgPool,
  template_service_id: i64,
) -> Result<ServiceTemplate, CoreError> {
  let row = sqlx::query(
    "SELECT id, name, image_name, image_tag, restart_policy, \
     command, ports, volumes, env_vars, labels, domains, healthcheck, \
     dependencies, config_files, category FROM service_templates \
     WHERE id = $1",
  )
  .bind(template_service_id)
  .fetch_optional(pool)
  .await
  .map_err(internal)?
  .ok_or_else(|| {
    CoreError::NotFound(format!(
      "service template {template_service_id} not found"
    ))
  })?;

  Ok(ServiceTemplate {
    id: row.try_get("id").map_err(internal)?,
    name: row.try_get("name").map_err(internal)?,
    image_name: row.try_get("image_name").map_err(internal)?,
    image_tag: row.try_get("image_tag").map_err(internal)?,
    restart_policy: row
      .try_get::<Json<RestartPolicy>, _>("restart_policy")
      .map_err(internal)?
      .0,
    command: row.try_get("command").map_err(internal)?,
    ports: row
      .try_get::<Json<Vec<PortMapping>>, _>("ports")
      .map_err(internal)?
      .0,
    volumes: row
      .try_get::<Json<Vec<VolumeMapping>>, _>("volumes")
      .map_err(internal)?
      .0,
    env_vars: row
      .try_get::<Json<Vec<EnvVar>>, _>("env_vars")
      .map_err(internal)?
      .0,
    labels: row
      .try_get::<Json<Vec<Label>>, _>("labels")
      .map_err(internal)?
      .0,
    domains: row
      .try_get::<Json<Vec<Domain>>, _>("domains")
      .map_err(internal)?
      .0,
    healthcheck: row
      .try_get::<Option<Json<Healthcheck>>, _>("healthcheck")
      .map_err(internal)?
      .map(|Json(v)| v),
    dependencies: row
      .try_get::<Json<Vec<Dependency>>, _>("dependencies")
      .map_err(internal)?
      .0,
    config_files: row
      .try_get::<Json<Vec<ConfigFile>>, _>("config_files")
      .map_err(internal)?
      .0,
    category: row.try_get("category").map_err(internal)?,
  })
}

/// Override rows are stored one-per-instance as JSONB columns; an absent
/// row means every category is empty (the template list is used as-is
/// for all of them).
pub async fn get_overrides(
  pool: &PgPool,
  instance_id: i64,
) -> Result<InstanceOverrides, CoreError> {
  let row = sqlx::query(
    "SELECT ports, volumes, env_vars, labels, domains, healthcheck, \
     dependencies, config_files FROM instance_overrides \
     WHERE instance_id = $1",
  )
  .bind(instance_id)
  .fetch_optional(pool)
  .await
  .map_err(internal)?;

  let Some(row) = row else {
    return Ok(InstanceOverrides::default());
  };

  Ok(InstanceOverrides {
    ports: row
      .try_get::<Json<Vec<PortMapping>>, _>("ports")
      .map_err(internal)?
      .0,
    volumes: row
      .try_get::<Json<Vec<VolumeMapping>>, _>("volumes")
      .map_err(internal)?
      .0,
    env_vars: row
      .try_get::<Json<Vec<EnvVar>>, _>("env_vars")
      .map_err(internal)?
      .0,
    labels: row
      .try_get::<Json<Vec<Label>>, _>("labels")
      .map_err(internal)?
      .0,
    domains: row
      .try_get::<Json<Vec<Domain>>, _>("domains")
      .map_err(internal)?
      .0,
    healthcheck: row
      .try_get::<Option<Json<Healthcheck>>, _>("healthcheck")
      .map_err(internal)?
      .map(|Json(v)| v),
    dependencies: row
      .try_get::<Json<Vec<Dependency>>, _>("dependencies")
      .map_err(internal)?
      .0,
    config_files: row
      .try_get::<Json<Vec<ConfigFile>>, _>("config_files")
      .map_err(internal)?
      .0,
  })
}
