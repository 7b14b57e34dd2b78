use std::time::Duration;

use sqlx::{Connection, PgConnection};

use crate::error::CoreError;

/// Backs a per-stack advisory lock. The try-lock and unlock must reach
/// the same session of the external datastore, so one backend instance
/// owns a single dedicated connection for the lifetime of one apply —
/// never a pool-borrowed connection.
pub trait LockBackend: Send {
  async fn try_lock(&mut self, key: i64) -> Result<bool, CoreError>;
  async fn unlock(&mut self, key: i64) -> Result<(), CoreError>;
}

/// Postgres-backed session-scoped advisory lock, via
/// `pg_try_advisory_lock` / `pg_advisory_unlock` on a dedicated
/// connection opened outside the shared pool.
pub struct PgLockBackend {
  conn: PgConnection,
}

impl PgLockBackend {
  pub async fn connect(database_url: &str) -> Result<Self, CoreError> {
    let conn = PgConnection::connect(database_url)
      .await
      .map_err(|e| CoreError::Internal(e.into()))?;
    Ok(Self { conn })
  }
}

impl LockBackend for PgLockBackend {
  async fn try_lock(&mut self, key: i64) -> Result<bool, CoreError> {
    sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
      .bind(key)
      .fetch_one(&mut self.conn)
      .await
      .map_err(|e| CoreError::Internal(e.into()))
  }

  async fn unlock(&mut self, key: i64) -> Result<(), CoreError> {
    sqlx::query("SELECT pg_advisory_unlock($1)")
      .bind(key)
      .execute(&mut self.conn)
      .await
      .map_err(|e| CoreError::Internal(e.into()))?;
    Ok(())
  }
}

/// A held advisory lock on one stack. Dropping this without calling
/// [`release`](AdvisoryLock::release) still drops the underlying
/// connection, which ends the Postgres session and releases the lock —
/// but callers must still call `release` explicitly so it happens within
/// a bounded timeout, per the unlock-on-every-exit-path contract.
pub struct AdvisoryLock<B: LockBackend> {
  backend: B,
  key: i64,
}

impl<B: LockBackend> AdvisoryLock<B> {
  /// Attempts a non-blocking acquire on `key`. On failure, the backend is
  /// dropped immediately — there is nothing to release.
  pub async fn acquire(
    mut backend: B,
    key: i64,
  ) -> Result<Self, CoreError> {
    if !backend.try_lock(key).await? {
      return Err(CoreError::ConflictLock);
    }
    Ok(Self { backend, key })
  }

  /// Releases on a fresh, bounded-timeout, non-cancelable future, so a
  /// disconnected caller can never leak the lock.
  pub async fn release(mut self, timeout: Duration) {
    let key = self.key;
    let release = async {
      if let Err(e) = self.backend.unlock(key).await {
        tracing::error!(
          "failed to release advisory lock for key {key}: {e:#}"
        );
      }
    };
    if tokio::time::timeout(timeout, release).await.is_err() {
      tracing::error!(
        "releasing advisory lock for key {key} exceeded {timeout:?}"
      );
    }
  }
}

#[cfg(test)]
pub mod fake {
  use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
  };

  use super::*;

  /// In-memory lock backend for apply-pipeline tests: no subprocess, no
  /// database. Shared `held` set simulates cross-session visibility so a
  /// test can acquire the same key twice and observe the second attempt
  /// fail.
  #[derive(Clone, Default)]
  pub struct FakeLockBackend {
    held: Arc<Mutex<HashSet<i64>>>,
    mine: Option<i64>,
  }

  impl FakeLockBackend {
    pub fn new(held: Arc<Mutex<HashSet<i64>>>) -> Self {
      Self { held, mine: None }
    }
  }

  impl LockBackend for FakeLockBackend {
    async fn try_lock(&mut self, key: i64) -> Result<bool, CoreError> {
      let mut held = self.held.lock().unwrap();
      if held.contains(&key) {
        return Ok(false);
      }
      held.insert(key);
      self.mine = Some(key);
      Ok(true)
    }

    async fn unlock(&mut self, key: i64) -> Result<(), CoreError> {
      self.held.lock().unwrap().remove(&key);
      self.mine = None;
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
  };

  use super::{AdvisoryLock, fake::FakeLockBackend};

  #[tokio::test]
  async fn second_acquire_for_same_key_conflicts() {
    let held = Arc::new(Mutex::new(HashSet::new()));
    let first = AdvisoryLock::acquire(FakeLockBackend::new(held.clone()), 42)
      .await
      .unwrap();
    let second = AdvisoryLock::acquire(FakeLockBackend::new(held.clone()), 42).await;
    assert!(second.is_err());
    first.release(Duration::from_secs(1)).await;
    let third = AdvisoryLock::acquire(FakeLockBackend::new(held), 42).await;
    assert!(third.is_ok());
  }

  #[tokio::test]
  async fn distinct_keys_do_not_conflict() {
    let held = Arc::new(Mutex::new(HashSet::new()));
    let a = AdvisoryLock::acquire(FakeLockBackend::new(held.clone()), 1)
      .await
      .unwrap();
    let b = AdvisoryLock::acquire(FakeLockBackend::new(held), 2).await;
    assert!(b.is_ok());
    a.release(Duration::from_secs(1)).await;
  }
}
