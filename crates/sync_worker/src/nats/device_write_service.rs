use crate::domain::MirrorService;
use common::codec::parse_device_write_event;
use common::nats::{ConsumeRequest, ConsumeResponse};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;
use tracing::{debug, error};

/// Tower service for processing individual device write messages.
///
/// This service:
/// 1. Parses the subject and JSON payload into a DeviceWriteEvent
/// 2. Delegates to the MirrorService for projection
/// 3. Returns Ack on success, Nak on failure
#[derive(Clone)]
pub struct DeviceWriteService {
    mirror: Arc<MirrorService>,
}

impl DeviceWriteService {
    pub fn new(mirror: Arc<MirrorService>) -> Self {
        Self { mirror }
    }
}

impl Service<ConsumeRequest> for DeviceWriteService {
    type Response = ConsumeResponse;
    type Error = anyhow::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ConsumeRequest) -> Self::Future {
        let mirror = Arc::clone(&self.mirror);
        let subject = req.subject.clone();
        let payload = req.payload.clone();

        Box::pin(async move {
            let event = match parse_device_write_event(&subject, &payload) {
                Ok(e) => e,
                Err(e) => {
                    error!(
                        subject = %subject,
                        error = %e,
                        "failed to parse device write event"
                    );
                    return Ok(ConsumeResponse::nak(format!("parse error: {}", e)));
                }
            };

            debug!(
                room_id = %event.room_id,
                device_id = %event.device_id,
                deletion = event.is_deletion(),
                "processing device write event"
            );

            match mirror.apply(event).await {
                Ok(()) => Ok(ConsumeResponse::Ack),
                Err(e) => {
                    error!(
                        subject = %subject,
                        error = %e,
                        "failed to mirror device write event"
                    );
                    Ok(ConsumeResponse::nak(format!("mirror error: {}", e)))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use common::domain::MockMirrorStore;
    use serde_json::json;

    fn request(subject: &str, payload: serde_json::Value) -> ConsumeRequest {
        ConsumeRequest::new(
            subject.to_string(),
            Bytes::from(payload.to_string()),
            None,
        )
    }

    #[tokio::test]
    async fn test_write_event_is_acked() {
        let mut store = MockMirrorStore::new();
        store
            .expect_put()
            .withf(|key, record| key == "rooms/r1/d1" && record.status == "on")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut service =
            DeviceWriteService::new(Arc::new(MirrorService::new(Arc::new(store))));

        let response = service
            .call(request(
                "rooms.r1.devices.d1",
                json!({"after": {"status": "on"}}),
            ))
            .await
            .unwrap();

        assert!(response.is_ack());
    }

    #[tokio::test]
    async fn test_deletion_event_is_acked() {
        let mut store = MockMirrorStore::new();
        store
            .expect_delete()
            .withf(|key| key == "rooms/r1/d1")
            .times(1)
            .returning(|_| Ok(()));

        let mut service =
            DeviceWriteService::new(Arc::new(MirrorService::new(Arc::new(store))));

        let response = service
            .call(request("rooms.r1.devices.d1", json!({"after": null})))
            .await
            .unwrap();

        assert!(response.is_ack());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_naked() {
        let store = MockMirrorStore::new();
        let mut service =
            DeviceWriteService::new(Arc::new(MirrorService::new(Arc::new(store))));

        let response = service
            .call(ConsumeRequest::new(
                "rooms.r1.devices.d1".to_string(),
                Bytes::from_static(b"not json"),
                None,
            ))
            .await
            .unwrap();

        assert!(response.is_nak());
    }

    #[tokio::test]
    async fn test_store_failure_is_naked_for_redelivery() {
        let mut store = MockMirrorStore::new();
        store
            .expect_put()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("kv unavailable")));

        let mut service =
            DeviceWriteService::new(Arc::new(MirrorService::new(Arc::new(store))));

        let response = service
            .call(request(
                "rooms.r1.devices.d1",
                json!({"after": {"status": "on"}}),
            ))
            .await
            .unwrap();

        assert!(response.is_nak());
    }
}
