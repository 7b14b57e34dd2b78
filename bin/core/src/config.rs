use std::sync::OnceLock;

use logger::{LogConfig, LogLevel, StdioLogMode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Env {
  database_url: String,
  #[serde(default = "default_bind_address")]
  bind_address: String,
  #[serde(default = "default_project_root")]
  project_root: String,
  #[serde(default = "default_config_subdir")]
  config_subdir: String,
  #[serde(default = "default_name_prefix")]
  name_prefix: String,
  #[serde(default = "default_runtime_priority")]
  runtime_priority: String,
  #[serde(default = "default_unlock_timeout_secs")]
  unlock_timeout_secs: u64,
  #[serde(default)]
  log_level: LogLevel,
  #[serde(default)]
  log_stdio: StdioLogMode,
  #[serde(default)]
  log_pretty: bool,
}

fn default_bind_address() -> String {
  "0.0.0.0:9500".to_string()
}

fn default_project_root() -> String {
  "/srv/stackyard".to_string()
}

fn default_config_subdir() -> String {
  "configs".to_string()
}

fn default_name_prefix() -> String {
  "sy".to_string()
}

fn default_runtime_priority() -> String {
  "daemonless,daemonful".to_string()
}

fn default_unlock_timeout_secs() -> u64 {
  5
}

/// Process-wide resolved configuration. Parsed once from the environment
/// (after an optional `.env` is loaded) behind a `OnceLock`, mirroring
/// the core_config() pattern used throughout this codebase.
#[derive(Debug)]
pub struct AppConfig {
  pub database_url: String,
  pub bind_address: String,
  pub project_root: String,
  pub config_subdir: String,
  pub name_prefix: String,
  pub runtime_priority: Vec<String>,
  pub unlock_timeout_secs: u64,
  pub logging: LogConfig,
}

impl AppConfig {
  pub fn config_root(&self, stack_name: &str) -> std::path::PathBuf {
    std::path::Path::new(&self.project_root)
      .join(&self.config_subdir)
      .join(stack_name)
  }
}

pub fn app_config() -> &'static AppConfig {
  static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();
  APP_CONFIG.get_or_init(|| {
    let env: Env = envy::from_env()
      .unwrap_or_else(|e| panic!("failed to parse environment: {e:?}"));
    AppConfig {
      database_url: env.database_url,
      bind_address: env.bind_address,
      project_root: env.project_root,
      config_subdir: env.config_subdir,
      name_prefix: env.name_prefix,
      runtime_priority: env
        .runtime_priority
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect(),
      unlock_timeout_secs: env.unlock_timeout_secs,
      logging: LogConfig {
        level: env.log_level,
        stdio: env.log_stdio,
        pretty: env.log_pretty,
        ansi: true,
      },
    }
  })
}
