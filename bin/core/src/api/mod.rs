mod handlers;

use axum::{
  Router,
  routing::{get, post},
};

use crate::state::AppState;

/// The exact four routes this binary exposes. No auth middleware, no
/// session handling — request in, engine call, response out.
pub fn router() -> Router<AppState> {
  Router::new()
    .route("/stacks/{name}/plan", get(handlers::get_plan))
    .route("/stacks/{name}/apply", post(handlers::post_apply))
    .route("/stacks/{name}/network", get(handlers::get_network))
    .route(
      "/stacks/{name}/instances/{instance}/effective",
      get(handlers::get_effective),
    )
}
