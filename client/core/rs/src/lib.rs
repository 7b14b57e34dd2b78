pub mod entities;

/// Current unix timestamp in milliseconds.
pub fn stackyard_timestamp() -> i64 {
  chrono::Utc::now().timestamp_millis()
}
