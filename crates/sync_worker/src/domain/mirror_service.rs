use crate::domain::effective_status;
use common::domain::{
    mirror_key, DeviceWriteEvent, DomainError, DomainResult, MirrorRecord, MirrorStore,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Applies document-write events to the flat mirror store.
///
/// One call per event, no state beyond the shared store handle. Calls for
/// the same device may run concurrently; the last write to complete wins.
pub struct MirrorService {
    store: Arc<dyn MirrorStore>,
}

impl MirrorService {
    pub fn new(store: Arc<dyn MirrorStore>) -> Self {
        Self { store }
    }

    /// Project a write event into the mirror store.
    ///
    /// When the post-write document exists, the mirrored record is fully
    /// overwritten with its (possibly defaulted) status and a fresh
    /// timestamp. When it does not, the mirrored record is removed. Store
    /// errors propagate so the event layer can redeliver.
    #[instrument(
        skip(self, event),
        fields(room_id = %event.room_id, device_id = %event.device_id)
    )]
    pub async fn apply(&self, event: DeviceWriteEvent) -> DomainResult<()> {
        let key = mirror_key(&event.room_id, &event.device_id);

        match event.after {
            Some(document) => {
                let status = effective_status(document.status.as_ref());
                let record = MirrorRecord::new(status);

                self.store
                    .put(&key, record)
                    .await
                    .map_err(|source| DomainError::MirrorWrite {
                        key: key.clone(),
                        source,
                    })?;

                debug!(key = %key, "mirrored device write");
            }
            None => {
                self.store
                    .delete(&key)
                    .await
                    .map_err(|source| DomainError::MirrorDelete {
                        key: key.clone(),
                        source,
                    })?;

                debug!(key = %key, "removed mirrored record");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{DeviceDocument, MockMirrorStore};
    use serde_json::json;

    fn write_event(status: Option<serde_json::Value>) -> DeviceWriteEvent {
        DeviceWriteEvent {
            room_id: "r1".to_string(),
            device_id: "d1".to_string(),
            after: Some(DeviceDocument {
                status,
                extra: serde_json::Map::new(),
            }),
        }
    }

    fn delete_event() -> DeviceWriteEvent {
        DeviceWriteEvent {
            room_id: "r1".to_string(),
            device_id: "d1".to_string(),
            after: None,
        }
    }

    #[tokio::test]
    async fn test_write_upserts_mirror_record() {
        let mut store = MockMirrorStore::new();
        store
            .expect_put()
            .withf(|key, record| key == "rooms/r1/d1" && record.status == "on")
            .times(1)
            .returning(|_, _| Ok(()));

        let service = MirrorService::new(Arc::new(store));
        service.apply(write_event(Some(json!("on")))).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_without_status_defaults_to_off() {
        let mut store = MockMirrorStore::new();
        store
            .expect_put()
            .withf(|key, record| key == "rooms/r1/d1" && record.status == "off")
            .times(1)
            .returning(|_, _| Ok(()));

        let service = MirrorService::new(Arc::new(store));
        service.apply(write_event(None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_deletion_removes_mirror_record() {
        let mut store = MockMirrorStore::new();
        store
            .expect_delete()
            .withf(|key| key == "rooms/r1/d1")
            .times(1)
            .returning(|_| Ok(()));

        let service = MirrorService::new(Arc::new(store));
        service.apply(delete_event()).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_mirror_write_error() {
        let mut store = MockMirrorStore::new();
        store
            .expect_put()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("kv unavailable")));

        let service = MirrorService::new(Arc::new(store));
        let err = service
            .apply(write_event(Some(json!("on"))))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::MirrorWrite { .. }));
        assert!(err.is_retryable());
    }
}
