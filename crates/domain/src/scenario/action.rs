//! Action — a side effect performed when a scenario fires.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::Payload;

/// The closed set of side effects a scenario can perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Send a command to a device through the device registry.
    DeviceCommand {
        #[serde(default, skip_serializing_if = "String::is_empty")]
        device_id: String,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        command: String,
        #[serde(default, skip_serializing_if = "Payload::is_empty")]
        params: Payload,
    },
    /// Notify the owner. Reads `title`, `message` and `priority` from `params`.
    Notification {
        #[serde(default)]
        params: Payload,
    },
    /// POST `params.body` to `params.url`.
    Webhook {
        #[serde(default)]
        params: Payload,
    },
}

impl ActionKind {
    /// Stable name used for logging and metric labels.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceCommand { .. } => "device_command",
            Self::Notification { .. } => "notification",
            Self::Webhook { .. } => "webhook",
        }
    }
}

/// One step of a scenario: an optional delay followed by a side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(flatten)]
    pub kind: ActionKind,
    /// Seconds to wait before performing the action.
    #[serde(default, alias = "delay")]
    pub delay_seconds: u64,
}

impl Action {
    #[must_use]
    pub fn device_command(device_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self::from(ActionKind::DeviceCommand {
            device_id: device_id.into(),
            command: command.into(),
            params: Payload::new(),
        })
    }

    #[must_use]
    pub fn notification(title: &str, message: &str, priority: &str) -> Self {
        let mut params = Payload::new();
        params.insert("title".to_string(), Value::from(title));
        params.insert("message".to_string(), Value::from(message));
        params.insert("priority".to_string(), Value::from(priority));
        Self::from(ActionKind::Notification { params })
    }

    #[must_use]
    pub fn webhook(url: &str, body: Value) -> Self {
        let mut params = Payload::new();
        params.insert("url".to_string(), Value::from(url));
        params.insert("body".to_string(), body);
        Self::from(ActionKind::Webhook { params })
    }

    /// Wait `seconds` before running this action.
    #[must_use]
    pub fn after(mut self, seconds: u64) -> Self {
        self.delay_seconds = seconds;
        self
    }
}

impl From<ActionKind> for Action {
    fn from(kind: ActionKind) -> Self {
        Self {
            kind,
            delay_seconds: 0,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ActionKind::DeviceCommand {
                device_id, command, ..
            } => write!(f, "device_command({command}, {device_id})")?,
            ActionKind::Notification { .. } => f.write_str("notification")?,
            ActionKind::Webhook { params } => write!(
                f,
                "webhook({})",
                params.get("url").and_then(Value::as_str).unwrap_or("?")
            )?,
        }
        if self.delay_seconds > 0 {
            write!(f, " after {}s", self.delay_seconds)?;
        }
        Ok(())
    }
}
