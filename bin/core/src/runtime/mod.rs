mod cli;
#[cfg(test)]
pub mod fake;

pub use cli::CliRuntimeDriver;

use std::collections::BTreeMap;

use stackyard_client::entities::runtime::{
  ComposeOutput, NetworkInspect, RuntimeVariant,
};

use crate::error::CoreError;

/// Runtime-agnostic facade over container/network operations, the same
/// interface for both runtime variants. Every invocation goes over the
/// runtime's CLI, never a library SDK — this is what lets one driver
/// work uniformly across runtime versions without chasing API
/// divergence between variants.
pub trait RuntimeDriver: Send + Sync {
  /// Inspects first; if present, treats it as success. Otherwise creates
  /// with `--driver bridge` and one `--label k=v` per entry. Idempotent.
  async fn create_network(
    &self,
    name: &str,
    labels: &BTreeMap<String, String>,
  ) -> Result<(), CoreError>;

  /// Not-found is treated as success.
  async fn remove_network(&self, name: &str) -> Result<(), CoreError>;

  async fn inspect_network(
    &self,
    name: &str,
  ) -> Result<NetworkInspect, CoreError>;

  async fn list_networks(
    &self,
    label_filter: &str,
  ) -> Result<Vec<String>, CoreError>;

  async fn list_containers_with_labels(
    &self,
    filter: &BTreeMap<String, String>,
  ) -> Result<Vec<String>, CoreError>;

  async fn run_compose(
    &self,
    project_name: &str,
    file: &std::path::Path,
    args: &[&str],
  ) -> Result<ComposeOutput, CoreError>;

  fn variant(&self) -> RuntimeVariant;
}

/// Probes each candidate runtime in priority order by running
/// `<binary> version` and taking the first one that exits zero.
pub async fn select_runtime(
  priority: &[String],
) -> Result<RuntimeVariant, CoreError> {
  for candidate in priority {
    let Some(variant) = parse_variant(candidate) else {
      tracing::warn!("unknown runtime variant in priority list: {candidate}");
      continue;
    };
    let probe = command::run(&format!("{} version", variant.binary()), None)
      .await;
    if probe.success() {
      return Ok(variant);
    }
    tracing::debug!(
      "runtime probe failed for {candidate}: {}",
      probe.combined()
    );
  }
  Err(CoreError::RuntimeFatal(format!(
    "no runtime available from priority list: {priority:?}"
  )))
}

fn parse_variant(name: &str) -> Option<RuntimeVariant> {
  match name {
    "daemonless" => Some(RuntimeVariant::Daemonless),
    "daemonful" => Some(RuntimeVariant::Daemonful),
    _ => None,
  }
}
