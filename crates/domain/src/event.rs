//! Device event — an inbound fact reported by a device.
//!
//! Events are produced by the ingestion pipeline (not by this engine) and
//! posted to the evaluation endpoint. They are never stored here.

use serde::{Deserialize, Serialize};

use crate::time::{self, Timestamp};

/// Free-form event payload, keyed by property name.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Something that happened on a device, as reported by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    /// Identifier assigned upstream; may be empty.
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub device_id: String,
    /// Principal owning the device. Upstream services still call it `user_id`.
    #[serde(alias = "user_id")]
    pub owner_id: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default = "time::now")]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub payload: Payload,
}

impl DeviceEvent {
    /// Build an event stamped with the current time and an empty payload.
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        device_id: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            event_id: String::new(),
            device_id: device_id.into(),
            owner_id: owner_id.into(),
            event_type: event_type.into(),
            timestamp: time::now(),
            payload: Payload::new(),
        }
    }

    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = event_id.into();
        self
    }

    /// Set one payload property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_user_id_as_owner_alias() {
        let event: DeviceEvent = serde_json::from_value(serde_json::json!({
            "event_id": "e1",
            "device_id": "d1",
            "user_id": "u1",
            "event_type": "motion_detected",
            "payload": {"temp": 21}
        }))
        .unwrap();
        assert_eq!(event.owner_id, "u1");
        assert_eq!(event.payload["temp"], 21);
    }

    #[test]
    fn should_default_missing_fields() {
        let before = time::now();
        let event: DeviceEvent =
            serde_json::from_value(serde_json::json!({"owner_id": "u1"})).unwrap();
        assert!(event.event_id.is_empty());
        assert!(event.payload.is_empty());
        assert!(event.timestamp >= before);
    }

    #[test]
    fn should_reject_event_without_owner() {
        let result: Result<DeviceEvent, _> =
            serde_json::from_value(serde_json::json!({"device_id": "d1"}));
        assert!(result.is_err());
    }

    #[test]
    fn should_build_event_with_properties() {
        let event = DeviceEvent::new("u1", "d1", "reading")
            .with_event_id("e9")
            .with_property("temp", serde_json::json!(80));
        assert_eq!(event.event_id, "e9");
        assert_eq!(event.payload.get("temp"), Some(&serde_json::json!(80)));
    }
}
