use std::{
  collections::BTreeMap,
  sync::{Arc, Mutex},
};

use stackyard_client::entities::runtime::{
  ComposeOutput, NetworkInspect, RuntimeVariant,
};

use super::RuntimeDriver;
use crate::error::CoreError;

#[derive(Debug, Clone)]
struct FakeNetwork {
  labels: BTreeMap<String, String>,
}

/// In-memory stand-in for [`RuntimeDriver`], used by differ/plan/apply
/// tests. No subprocess is ever spawned.
#[derive(Clone, Default)]
pub struct FakeRuntimeDriver {
  networks: Arc<Mutex<BTreeMap<String, FakeNetwork>>>,
  containers: Arc<Mutex<BTreeMap<String, BTreeMap<String, String>>>>,
  pub fail_compose: Arc<Mutex<bool>>,
}

impl FakeRuntimeDriver {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_running_container(
    self,
    name: &str,
    labels: BTreeMap<String, String>,
  ) -> Self {
    self.containers.lock().unwrap().insert(name.to_string(), labels);
    self
  }
}

impl RuntimeDriver for FakeRuntimeDriver {
  async fn create_network(
    &self,
    name: &str,
    labels: &BTreeMap<String, String>,
  ) -> Result<(), CoreError> {
    self
      .networks
      .lock()
      .unwrap()
      .entry(name.to_string())
      .or_insert_with(|| FakeNetwork { labels: labels.clone() });
    Ok(())
  }

  async fn remove_network(&self, name: &str) -> Result<(), CoreError> {
    self.networks.lock().unwrap().remove(name);
    Ok(())
  }

  async fn inspect_network(
    &self,
    name: &str,
  ) -> Result<NetworkInspect, CoreError> {
    self
      .networks
      .lock()
      .unwrap()
      .get(name)
      .map(|net| NetworkInspect {
        name: name.to_string(),
        id: format!("fake-{name}"),
        driver: "bridge".to_string(),
        labels: net.labels.clone(),
        containers: Vec::new(),
      })
      .ok_or_else(|| {
        CoreError::NotFound(format!("network '{name}' not found"))
      })
  }

  async fn list_networks(
    &self,
    _label_filter: &str,
  ) -> Result<Vec<String>, CoreError> {
    Ok(self.networks.lock().unwrap().keys().cloned().collect())
  }

  async fn list_containers_with_labels(
    &self,
    filter: &BTreeMap<String, String>,
  ) -> Result<Vec<String>, CoreError> {
    Ok(
      self
        .containers
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, labels)| {
          filter.iter().all(|(k, v)| labels.get(k) == Some(v))
        })
        .map(|(name, _)| name.clone())
        .collect(),
    )
  }

  async fn run_compose(
    &self,
    _project_name: &str,
    _file: &std::path::Path,
    _args: &[&str],
  ) -> Result<ComposeOutput, CoreError> {
    if *self.fail_compose.lock().unwrap() {
      return Ok(ComposeOutput {
        stdout: String::new(),
        stderr: "fake compose failure".to_string(),
        exit_code: 1,
      });
    }
    Ok(ComposeOutput {
      stdout: "up-to-date".to_string(),
      stderr: String::new(),
      exit_code: 0,
    })
  }

  fn variant(&self) -> RuntimeVariant {
    RuntimeVariant::Daemonless
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn create_network_is_idempotent() {
    let driver = FakeRuntimeDriver::new();
    driver.create_network("net", &BTreeMap::new()).await.unwrap();
    driver.create_network("net", &BTreeMap::new()).await.unwrap();
    assert!(driver.inspect_network("net").await.is_ok());
  }

  #[tokio::test]
  async fn remove_missing_network_succeeds() {
    let driver = FakeRuntimeDriver::new();
    assert!(driver.remove_network("nope").await.is_ok());
  }
}
