//! Trigger — the event shape that makes a scenario eligible to fire.

use serde::{Deserialize, Serialize};

use crate::event::{DeviceEvent, Payload};

/// Kind of trigger.
///
/// Only [`TriggerKind::DeviceEvent`] is matched against inbound events.
/// Every other kind is stored as given but never fires during evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerKind {
    DeviceEvent,
    Schedule,
    #[default]
    Manual,
    Other(String),
}

impl From<String> for TriggerKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "device_event" => Self::DeviceEvent,
            "schedule" => Self::Schedule,
            "manual" => Self::Manual,
            _ => Self::Other(value),
        }
    }
}

impl From<TriggerKind> for String {
    fn from(kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::DeviceEvent => "device_event".to_string(),
            TriggerKind::Schedule => "schedule".to_string(),
            TriggerKind::Manual => "manual".to_string(),
            TriggerKind::Other(other) => other,
        }
    }
}

/// Describes which device events activate a scenario.
///
/// Empty `device_id` / `event` fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event: String,
    /// Cron expression for schedule triggers; informational only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Payload::is_empty")]
    pub params: Payload,
}

impl Trigger {
    /// A `device_event` trigger restricted to the given device and event type.
    ///
    /// Pass empty strings to leave either field as a wildcard.
    #[must_use]
    pub fn device_event(device_id: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            kind: TriggerKind::DeviceEvent,
            device_id: device_id.into(),
            event: event.into(),
            ..Self::default()
        }
    }

    /// Check whether this trigger matches a given event.
    #[must_use]
    pub fn matches(&self, event: &DeviceEvent) -> bool {
        if self.kind != TriggerKind::DeviceEvent {
            return false;
        }
        if !self.device_id.is_empty() && self.device_id != event.device_id {
            return false;
        }
        if !self.event.is_empty() && self.event != event.event_type {
            return false;
        }
        true
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TriggerKind::DeviceEvent => {
                let device = if self.device_id.is_empty() {
                    "*"
                } else {
                    &self.device_id
                };
                let event = if self.event.is_empty() {
                    "*"
                } else {
                    &self.event
                };
                write!(f, "device_event({device}, {event})")
            }
            TriggerKind::Schedule => write!(f, "schedule({})", self.schedule),
            TriggerKind::Manual => f.write_str("manual"),
            TriggerKind::Other(other) => f.write_str(other),
        }
    }
}
