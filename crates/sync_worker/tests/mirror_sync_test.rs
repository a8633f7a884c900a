use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use common::domain::{MirrorRecord, MirrorStore};
use common::nats::{ConsumeRequest, ConsumeResponse};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use sync_worker::domain::MirrorService;
use sync_worker::nats::DeviceWriteService;
use tower::Service;

/// In-memory flat store standing in for the real key-value database.
struct InMemoryMirrorStore {
    records: Mutex<HashMap<String, MirrorRecord>>,
}

impl InMemoryMirrorStore {
    fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, key: &str) -> Option<MirrorRecord> {
        self.records.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl MirrorStore for InMemoryMirrorStore {
    async fn put(&self, key: &str, record: MirrorRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert(key.to_string(), record);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // No-op when the key is absent
        self.records.lock().unwrap().remove(key);
        Ok(())
    }
}

fn service_with_store() -> (DeviceWriteService, Arc<InMemoryMirrorStore>) {
    let store = Arc::new(InMemoryMirrorStore::new());
    let mirror = Arc::new(MirrorService::new(store.clone() as Arc<dyn MirrorStore>));
    (DeviceWriteService::new(mirror), store)
}

async fn deliver(service: &mut DeviceWriteService, subject: &str, payload: &str) -> ConsumeResponse {
    service
        .call(ConsumeRequest::new(
            subject.to_string(),
            Bytes::from(payload.to_string()),
            None,
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_write_then_default_then_delete_scenario() {
    let (mut service, store) = service_with_store();

    // Write {status: "on"} for room r1, device d1
    let response = deliver(
        &mut service,
        "rooms.r1.devices.d1",
        r#"{"after": {"status": "on"}}"#,
    )
    .await;
    assert!(response.is_ack());

    let record = store.get("rooms/r1/d1").expect("record should exist");
    assert_eq!(record.status, "on");
    assert!(chrono::DateTime::parse_from_rfc3339(&record.updated_at).is_ok());

    // Write {} (no status field) - mirrored status defaults to "off"
    let response = deliver(&mut service, "rooms.r1.devices.d1", r#"{"after": {}}"#).await;
    assert!(response.is_ack());
    assert_eq!(store.get("rooms/r1/d1").unwrap().status, "off");

    // Delete the source document - mirrored record disappears
    let response = deliver(&mut service, "rooms.r1.devices.d1", r#"{"after": null}"#).await;
    assert!(response.is_ack());
    assert!(store.get("rooms/r1/d1").is_none());
}

#[tokio::test]
async fn test_replayed_write_is_idempotent_in_status() {
    let (mut service, store) = service_with_store();
    let payload = r#"{"after": {"status": "on"}}"#;

    deliver(&mut service, "rooms.r1.devices.d1", payload).await;
    let first = store.get("rooms/r1/d1").unwrap();

    deliver(&mut service, "rooms.r1.devices.d1", payload).await;
    let second = store.get("rooms/r1/d1").unwrap();

    // Same status on replay; the timestamp may differ
    assert_eq!(first.status, second.status);
}

#[tokio::test]
async fn test_delete_of_absent_record_is_a_noop() {
    let (mut service, store) = service_with_store();

    let response = deliver(&mut service, "rooms.r9.devices.d9", r#"{"after": null}"#).await;
    assert!(response.is_ack());
    assert!(store.get("rooms/r9/d9").is_none());
}

#[tokio::test]
async fn test_devices_mirror_independently() {
    let (mut service, store) = service_with_store();

    deliver(
        &mut service,
        "rooms.r1.devices.d1",
        r#"{"after": {"status": "on"}}"#,
    )
    .await;
    deliver(
        &mut service,
        "rooms.r1.devices.d2",
        r#"{"after": {"status": "standby"}}"#,
    )
    .await;
    deliver(&mut service, "rooms.r2.devices.d1", r#"{"after": {}}"#).await;

    assert_eq!(store.get("rooms/r1/d1").unwrap().status, "on");
    assert_eq!(store.get("rooms/r1/d2").unwrap().status, "standby");
    assert_eq!(store.get("rooms/r2/d1").unwrap().status, "off");

    // Deleting one device leaves the others untouched
    deliver(&mut service, "rooms.r1.devices.d1", r#"{"after": null}"#).await;
    assert!(store.get("rooms/r1/d1").is_none());
    assert!(store.get("rooms/r1/d2").is_some());
    assert!(store.get("rooms/r2/d1").is_some());
}

#[tokio::test]
async fn test_falsy_statuses_mirror_as_off() {
    let (mut service, store) = service_with_store();

    for (device, payload) in [
        ("d1", r#"{"after": {"status": null}}"#),
        ("d2", r#"{"after": {"status": ""}}"#),
        ("d3", r#"{"after": {"status": false}}"#),
        ("d4", r#"{"after": {"status": 0}}"#),
    ] {
        let subject = format!("rooms.r1.devices.{device}");
        deliver(&mut service, &subject, payload).await;
        assert_eq!(
            store.get(&format!("rooms/r1/{device}")).unwrap().status,
            "off",
            "payload {payload} should mirror as off"
        );
    }
}

#[tokio::test]
async fn test_unknown_subject_shape_is_naked_without_store_writes() {
    let (mut service, store) = service_with_store();

    let response = deliver(&mut service, "rooms.r1.gateways.g1", r#"{"after": {}}"#).await;
    assert!(response.is_nak());
    assert!(store.records.lock().unwrap().is_empty());
}
