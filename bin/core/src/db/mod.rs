mod lock;
mod repo;

pub use lock::{AdvisoryLock, LockBackend, PgLockBackend};
#[cfg(test)]
pub use lock::fake;
pub use repo::*;

use sqlx::PgPool;

/// Connects the shared pool used for ordinary repository reads/writes.
/// The advisory lock's dedicated connection is opened separately, per
/// apply, and never drawn from this pool (see [`AdvisoryLock::acquire`]).
pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
  PgPool::connect(database_url)
    .await
    .map_err(|e| anyhow::anyhow!("failed to connect to database: {e:#}"))
}
