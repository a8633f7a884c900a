use anyhow::Result;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Flat per-device projection of a source document.
///
/// Exists only as a projection: it is overwritten whenever the source
/// document is written and removed when the source is deleted. `updated_at`
/// is the timestamp of the mirror operation, not of the source write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRecord {
    pub status: String,
    /// RFC 3339 / ISO-8601 timestamp of when the record was mirrored.
    pub updated_at: String,
}

impl MirrorRecord {
    /// Creates a record with the given status, stamped with the current time.
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Computes the flat store key for a device.
///
/// Mirrors the hierarchical path `rooms/{room_id}/devices/{device_id}` down
/// to `rooms/{room_id}/{device_id}`.
pub fn mirror_key(room_id: &str, device_id: &str) -> String {
    format!("rooms/{}/{}", room_id, device_id)
}

/// Trait for the flat key-value store holding mirrored records.
///
/// The handle is constructed once at startup and shared read-write across
/// all invocations; implementations must be safe for concurrent use.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Upsert a record at the given key, fully overwriting any prior value.
    async fn put(&self, key: &str, record: MirrorRecord) -> Result<()>;

    /// Delete the record at the given key. Must be a no-op when absent.
    async fn delete(&self, key: &str) -> Result<()>;
}
