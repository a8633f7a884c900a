use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Post-write state of a source device document.
///
/// Documents live in the hierarchical store under
/// `rooms/{room_id}/devices/{device_id}` and are written by upstream actors
/// outside this system's control. Only `status` is interpreted here; any
/// other attributes are carried opaquely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceDocument {
    /// Device status. Optional - the mirror applies a default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,

    /// Remaining document attributes, preserved but not interpreted.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A single document-write event for a device, as delivered by the event
/// stream. `after` is the document state after the write; `None` means the
/// source document no longer exists (deletion).
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceWriteEvent {
    pub room_id: String,
    pub device_id: String,
    pub after: Option<DeviceDocument>,
}

impl DeviceWriteEvent {
    pub fn is_deletion(&self) -> bool {
        self.after.is_none()
    }
}
