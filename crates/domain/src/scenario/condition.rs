//! Condition — a guard that must hold for a matched scenario to fire.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::{DeviceEvent, Payload};

/// Last known status of devices, keyed by device id.
///
/// Filled by the application layer before evaluation so that condition
/// evaluation itself stays free of IO.
pub type DeviceStates = HashMap<String, Payload>;

/// Kind of condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionKind {
    /// Compare a property of the triggering event's payload.
    ValueCompare,
    /// Compare a property of a device's current status.
    DeviceState,
    /// Any other kind; always satisfied.
    Other(String),
}

impl From<String> for ConditionKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "value_compare" => Self::ValueCompare,
            "device_state" => Self::DeviceState,
            _ => Self::Other(value),
        }
    }
}

impl From<ConditionKind> for String {
    fn from(kind: ConditionKind) -> Self {
        match kind {
            ConditionKind::ValueCompare => "value_compare".to_string(),
            ConditionKind::DeviceState => "device_state".to_string(),
            ConditionKind::Other(other) => other,
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
}

impl Operator {
    /// Compare `actual` against `expected`.
    ///
    /// Numbers are compared as `f64` when both sides are JSON numbers.
    /// Otherwise both sides are compared as text, which only supports
    /// [`Eq`](Self::Eq), [`Ne`](Self::Ne) and [`Contains`](Self::Contains).
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn apply(self, actual: &Value, expected: &Value) -> bool {
        if let (Some(a), Some(e)) = (actual.as_f64(), expected.as_f64()) {
            match self {
                Self::Eq => return a == e,
                Self::Ne => return a != e,
                Self::Gt => return a > e,
                Self::Lt => return a < e,
                Self::Gte => return a >= e,
                Self::Lte => return a <= e,
                Self::Contains => {}
            }
        }

        let actual = as_text(actual);
        let expected = as_text(expected);
        match self {
            Self::Eq => actual == expected,
            Self::Ne => actual != expected,
            Self::Contains => actual.contains(expected.as_ref()),
            Self::Gt | Self::Lt | Self::Gte | Self::Lte => false,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Contains => "contains",
        })
    }
}

fn as_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

/// A predicate evaluated after the trigger matched.
///
/// All conditions of a scenario must hold (logical AND).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    /// Device whose status is inspected by `device_state`; defaults to
    /// the triggering device when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub property: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    /// `value_compare` condition on a payload property.
    #[must_use]
    pub fn value_compare(property: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            kind: ConditionKind::ValueCompare,
            device_id: String::new(),
            property: property.into(),
            operator,
            value,
        }
    }

    /// `device_state` condition on a status property of `device_id`.
    #[must_use]
    pub fn device_state(
        device_id: impl Into<String>,
        property: impl Into<String>,
        operator: Operator,
        value: Value,
    ) -> Self {
        Self {
            kind: ConditionKind::DeviceState,
            device_id: device_id.into(),
            property: property.into(),
            operator,
            value,
        }
    }

    /// The device whose status must be known to evaluate this condition,
    /// if any.
    #[must_use]
    pub fn required_device<'a>(&'a self, event: &'a DeviceEvent) -> Option<&'a str> {
        match self.kind {
            ConditionKind::DeviceState if self.device_id.is_empty() => Some(&event.device_id),
            ConditionKind::DeviceState => Some(&self.device_id),
            ConditionKind::ValueCompare | ConditionKind::Other(_) => None,
        }
    }

    /// Evaluate this condition against an event and a device status snapshot.
    ///
    /// A missing property or an unknown device never satisfies the condition.
    #[must_use]
    pub fn holds(&self, event: &DeviceEvent, states: &DeviceStates) -> bool {
        let actual = match self.kind {
            ConditionKind::ValueCompare => event.payload.get(&self.property),
            ConditionKind::DeviceState => self
                .required_device(event)
                .and_then(|device| states.get(device))
                .and_then(|status| status.get(&self.property)),
            ConditionKind::Other(_) => return true,
        };
        actual.is_some_and(|actual| self.operator.apply(actual, &self.value))
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ConditionKind::ValueCompare => {
                write!(f, "{} {} {}", self.property, self.operator, self.value)
            }
            ConditionKind::DeviceState => write!(
                f,
                "{}.{} {} {}",
                self.device_id, self.property, self.operator, self.value
            ),
            ConditionKind::Other(other) => f.write_str(other),
        }
    }
}

/// Evaluate a sequence of conditions (logical AND). Returns `true` if empty.
#[must_use]
pub fn holds(conditions: &[Condition], event: &DeviceEvent, states: &DeviceStates) -> bool {
    conditions.iter().all(|c| c.holds(event, states))
}
