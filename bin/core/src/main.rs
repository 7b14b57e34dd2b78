#[macro_use]
extern crate tracing;

mod api;
mod apply;
mod compose;
mod config;
mod db;
mod differ;
mod error;
mod identity;
mod materialize;
mod network_status;
mod plan;
mod resolve;
mod runtime;
mod state;
mod token;

use config::app_config;
use runtime::CliRuntimeDriver;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  let config = app_config();
  logger::init(&config.logging)?;

  info!("stackyard core version: v{}", env!("CARGO_PKG_VERSION"));

  let pool = db::connect(&config.database_url).await?;

  let variant = runtime::select_runtime(&config.runtime_priority)
    .await
    .map_err(|e| anyhow::anyhow!("{e}"))?;
  info!("selected runtime: {variant}");
  let runtime_driver = CliRuntimeDriver::new(variant);

  let state = AppState { pool, runtime: runtime_driver };
  let app = api::router()
    .with_state(state)
    .layer(tower_http::cors::CorsLayer::permissive());

  let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
  info!("listening on {}", config.bind_address);

  let mut term_signal =
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

  tokio::select! {
    res = axum::serve(listener, app) => res?,
    _ = term_signal.recv() => {
      info!("received SIGTERM, shutting down");
    }
  }

  Ok(())
}
