use crate::domain::{DeviceDocument, DeviceWriteEvent, DomainError, DomainResult};
use serde::Deserialize;

/// Wire shape of a document-write event payload.
///
/// `after` carries the document state following the write. A missing or null
/// `after` signals that the source document no longer exists.
#[derive(Debug, Deserialize)]
struct WriteEnvelope {
    #[serde(default)]
    after: Option<DeviceDocument>,
}

/// Parse a device write event from a NATS message.
///
/// Path parameters come from the subject, the document state from the JSON
/// payload.
pub fn parse_device_write_event(subject: &str, payload: &[u8]) -> DomainResult<DeviceWriteEvent> {
    let (room_id, device_id) = parse_device_subject(subject)?;
    let envelope: WriteEnvelope = serde_json::from_slice(payload)?;

    Ok(DeviceWriteEvent {
        room_id,
        device_id,
        after: envelope.after,
    })
}

/// Extract `(room_id, device_id)` from a subject of the form
/// `rooms.{room_id}.devices.{device_id}`.
pub fn parse_device_subject(subject: &str) -> DomainResult<(String, String)> {
    let mut tokens = subject.split('.');
    match (
        tokens.next(),
        tokens.next(),
        tokens.next(),
        tokens.next(),
        tokens.next(),
    ) {
        (Some("rooms"), Some(room_id), Some("devices"), Some(device_id), None)
            if !room_id.is_empty() && !device_id.is_empty() =>
        {
            Ok((room_id.to_string(), device_id.to_string()))
        }
        _ => Err(DomainError::MalformedSubject(subject.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_device_subject() {
        let (room_id, device_id) = parse_device_subject("rooms.r1.devices.d1").unwrap();
        assert_eq!(room_id, "r1");
        assert_eq!(device_id, "d1");
    }

    #[test]
    fn test_parse_device_subject_rejects_other_shapes() {
        for subject in [
            "rooms.r1",
            "rooms.r1.devices",
            "rooms.r1.devices.d1.extra",
            "rooms..devices.d1",
            "gateways.g1.devices.d1",
            "",
        ] {
            assert!(
                parse_device_subject(subject).is_err(),
                "expected rejection for {subject:?}"
            );
        }
    }

    #[test]
    fn test_parse_write_event_with_document() {
        let payload = json!({"after": {"status": "on", "brightness": 80}});
        let event =
            parse_device_write_event("rooms.r1.devices.d1", payload.to_string().as_bytes())
                .unwrap();

        assert_eq!(event.room_id, "r1");
        assert_eq!(event.device_id, "d1");
        let doc = event.after.unwrap();
        assert_eq!(doc.status, Some(json!("on")));
        assert_eq!(doc.extra.get("brightness"), Some(&json!(80)));
    }

    #[test]
    fn test_parse_write_event_deletion() {
        let event = parse_device_write_event("rooms.r1.devices.d1", br#"{"after": null}"#).unwrap();
        assert!(event.is_deletion());

        // An absent `after` field reads the same as an explicit null.
        let event = parse_device_write_event("rooms.r1.devices.d1", b"{}").unwrap();
        assert!(event.is_deletion());
    }

    #[test]
    fn test_parse_write_event_without_status() {
        let event =
            parse_device_write_event("rooms.r1.devices.d1", br#"{"after": {}}"#).unwrap();
        let doc = event.after.unwrap();
        assert!(doc.status.is_none());
    }

    #[test]
    fn test_parse_write_event_rejects_invalid_json() {
        let result = parse_device_write_event("rooms.r1.devices.d1", b"not json");
        assert!(matches!(result, Err(DomainError::MalformedPayload(_))));
    }
}
