use sqlx::PgPool;

use crate::runtime::CliRuntimeDriver;

/// Shared state handed to every axum handler: the repository pool and
/// the runtime driver selected once at startup.
#[derive(Clone)]
pub struct AppState {
  pub pool: PgPool,
  pub runtime: CliRuntimeDriver,
}
