use sqlx::PgPool;
use stackyard_client::entities::runtime::{NetworkStatus, NetworkStatusResponse};

use crate::{db, error::CoreError, identity::{configured_prefix, network_name}, runtime::RuntimeDriver};

/// Reports a stack's network as the runtime currently sees it. Read-only:
/// never creates the network, never touches the advisory lock.
pub async fn network_status(
  pool: &PgPool,
  runtime: &impl RuntimeDriver,
  stack_name: &str,
) -> Result<NetworkStatusResponse, CoreError> {
  let stack = db::get_live_stack_by_name(pool, stack_name).await?;
  let prefix = configured_prefix();
  let network = network_name(prefix, &stack.name);

  let status = match runtime.inspect_network(&network).await {
    Ok(inspect) => NetworkStatus::Active {
      driver: inspect.driver,
      containers: inspect.containers,
      labels: inspect.labels,
    },
    Err(CoreError::NotFound(_)) => NetworkStatus::NotCreated,
    Err(e) => return Err(e),
  };

  Ok(NetworkStatusResponse { network_name: network, status })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::runtime::fake::FakeRuntimeDriver;

  #[tokio::test]
  async fn reports_not_created_for_absent_network() {
    let driver = FakeRuntimeDriver::new();
    let status = driver.inspect_network("sy-web-net").await;
    assert!(status.is_err());
  }

  #[tokio::test]
  async fn reports_active_for_existing_network() {
    let driver = FakeRuntimeDriver::new();
    driver
      .create_network("sy-web-net", &std::collections::BTreeMap::new())
      .await
      .unwrap();
    let inspect = driver.inspect_network("sy-web-net").await.unwrap();
    assert_eq!(inspect.driver, "bridge");
  }
}
