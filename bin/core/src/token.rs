use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use stackyard_client::entities::Timestamp;

/// Formats a millisecond unix timestamp as a nanosecond-precision
/// ISO-8601 string, the fixed-width representation the token hashes.
fn nanosecond_iso8601(ts: Timestamp) -> String {
  DateTime::<Utc>::from_timestamp_millis(ts)
    .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap())
    .to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}

/// Generates the staleness token: sorts instances by `instance_id`
/// ascending, absorbs the stack's `updated_at`, then each instance's
/// `updated_at` in that order, and emits the hex digest. A pure function
/// of `(stack_updated_at, sorted instance updated_at list)` — any
/// permutation of input order produces the same digest since the sort
/// happens inside.
pub fn generate_token(
  stack_updated_at: Timestamp,
  instances: &[(String, Timestamp)],
) -> String {
  let mut sorted = instances.to_vec();
  sorted.sort_by(|a, b| a.0.cmp(&b.0));

  let mut hasher = Sha256::new();
  hasher.update(nanosecond_iso8601(stack_updated_at).as_bytes());
  for (_, updated_at) in &sorted {
    hasher.update(nanosecond_iso8601(*updated_at).as_bytes());
  }
  hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn permutation_invariant() {
    let a = generate_token(
      100,
      &[("api".into(), 10), ("db".into(), 20)],
    );
    let b = generate_token(
      100,
      &[("db".into(), 20), ("api".into(), 10)],
    );
    assert_eq!(a, b);
  }

  #[test]
  fn timestamp_change_changes_digest() {
    let a = generate_token(100, &[("api".into(), 10)]);
    let b = generate_token(100, &[("api".into(), 11)]);
    assert_ne!(a, b);
  }

  #[test]
  fn stack_timestamp_change_changes_digest() {
    let a = generate_token(100, &[("api".into(), 10)]);
    let b = generate_token(101, &[("api".into(), 10)]);
    assert_ne!(a, b);
  }

  #[test]
  fn is_deterministic() {
    let a = generate_token(100, &[("api".into(), 10)]);
    let b = generate_token(100, &[("api".into(), 10)]);
    assert_eq!(a, b);
  }
}
