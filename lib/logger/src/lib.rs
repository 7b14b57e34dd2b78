use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
  EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdioLogMode {
  #[default]
  Standard,
  Json,
  None,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
  Error,
  Warn,
  #[default]
  Info,
  Debug,
  Trace,
}

impl From<LogLevel> for tracing::Level {
  fn from(level: LogLevel) -> Self {
    match level {
      LogLevel::Error => tracing::Level::ERROR,
      LogLevel::Warn => tracing::Level::WARN,
      LogLevel::Info => tracing::Level::INFO,
      LogLevel::Debug => tracing::Level::DEBUG,
      LogLevel::Trace => tracing::Level::TRACE,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  #[serde(default)]
  pub level: LogLevel,
  #[serde(default)]
  pub stdio: StdioLogMode,
  #[serde(default)]
  pub pretty: bool,
  #[serde(default = "default_true")]
  pub ansi: bool,
}

fn default_true() -> bool {
  true
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: LogLevel::default(),
      stdio: StdioLogMode::default(),
      pretty: false,
      ansi: true,
    }
  }
}

/// Builds and installs the global `tracing` subscriber. Shipping events
/// to a collector is an external concern and intentionally not wired up
/// here — this crate only emits structured events, it does not ship
/// them anywhere.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(
      LevelFilter::from(tracing::Level::from(config.level)).into(),
    )
    .from_env_lossy();

  let registry = Registry::default().with(filter);

  match (config.stdio, config.pretty) {
    (StdioLogMode::Standard, true) => registry
      .with(
        tracing_subscriber::fmt::layer()
          .pretty()
          .with_target(false)
          .with_ansi(config.ansi),
      )
      .try_init(),
    (StdioLogMode::Standard, false) => registry
      .with(
        tracing_subscriber::fmt::layer()
          .with_target(false)
          .with_ansi(config.ansi),
      )
      .try_init(),
    (StdioLogMode::Json, _) => {
      registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    }
    (StdioLogMode::None, _) => Ok(()),
  }
  .map_err(|e| anyhow::anyhow!("failed to init logger: {e:#}"))
}
