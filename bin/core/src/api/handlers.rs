use axum::{Json, extract::{Path, State}};
use serde::{Deserialize, Serialize};
use stackyard_client::entities::{
  effective_config::EffectiveConfig, plan::Plan,
  runtime::NetworkStatusResponse,
};

use crate::{
  apply, db, db::PgLockBackend, error::CoreResult, identity::configured_prefix,
  network_status, plan, resolve, state::AppState,
};

pub async fn get_plan(
  State(state): State<AppState>,
  Path(name): Path<String>,
) -> CoreResult<Json<Plan>> {
  let result = plan::plan(&state.pool, &state.runtime, &name).await?;
  Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
  pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
  pub status: &'static str,
  pub output: String,
}

pub async fn post_apply(
  State(state): State<AppState>,
  Path(name): Path<String>,
  Json(request): Json<ApplyRequest>,
) -> CoreResult<Json<ApplyResponse>> {
  let app_config = crate::config::app_config();
  let lock_backend = PgLockBackend::connect(&app_config.database_url).await?;
  let output = apply::apply(
    &state.pool,
    &state.runtime,
    lock_backend,
    &name,
    &request.token,
  )
  .await?;
  Ok(Json(ApplyResponse { status: "applied", output }))
}

pub async fn get_network(
  State(state): State<AppState>,
  Path(name): Path<String>,
) -> CoreResult<Json<NetworkStatusResponse>> {
  let result =
    network_status::network_status(&state.pool, &state.runtime, &name)
      .await?;
  Ok(Json(result))
}

pub async fn get_effective(
  State(state): State<AppState>,
  Path((stack_name, instance_id)): Path<(String, String)>,
) -> CoreResult<Json<EffectiveConfig>> {
  let prefix = configured_prefix();
  let stack = db::get_live_stack_by_name(&state.pool, &stack_name).await?;
  let instance =
    db::get_live_instance(&state.pool, stack.id, &instance_id).await?;
  let template =
    db::get_template(&state.pool, instance.template_service_id).await?;
  let overrides = db::get_overrides(&state.pool, instance.id).await?;
  let effective =
    resolve::resolve(prefix, &stack, &instance, &template, &overrides);
  Ok(Json(effective.redacted()))
}
