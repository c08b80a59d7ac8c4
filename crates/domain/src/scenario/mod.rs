//! Scenario — trigger → condition → action rules owned by a principal.
//!
//! A scenario has exactly one [`Trigger`] that determines which device
//! events make it eligible, optional [`Condition`]s that must all hold,
//! and one or more [`Action`]s executed in order when it fires.

mod action;
mod condition;
mod trigger;

pub use action::{Action, ActionKind};
pub use condition::{Condition, ConditionKind, DeviceStates, Operator, holds};
pub use trigger::{Trigger, TriggerKind};

use serde::{Deserialize, Serialize};

use crate::error::{ScenarioError, ValidationError};
use crate::event::DeviceEvent;
use crate::id::ScenarioId;
use crate::time::Timestamp;

/// A persisted automation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    #[serde(alias = "user_id")]
    pub owner_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub enabled: bool,
    pub trigger: Trigger,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Scenario {
    /// Materialize a new scenario from client input.
    ///
    /// Assigns a fresh id, stamps both timestamps with `now` and always
    /// starts enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Validation`] when the owner, the name or the
    /// action list is empty.
    pub fn create(draft: ScenarioDraft, now: Timestamp) -> Result<Self, ScenarioError> {
        if draft.owner_id.is_empty() {
            return Err(ValidationError::MissingOwner.into());
        }
        let scenario = Self {
            id: ScenarioId::new(),
            owner_id: draft.owner_id,
            name: draft.name,
            description: draft.description,
            enabled: true,
            trigger: draft.trigger,
            conditions: draft.conditions,
            actions: draft.actions,
            created_at: now,
            updated_at: now,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Build the replacement for this scenario.
    ///
    /// `id`, `owner_id` and `created_at` are preserved whatever the draft
    /// says; `enabled` is kept when the draft leaves it out.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Validation`] when the name or the action
    /// list is empty.
    pub fn replaced_by(&self, draft: ScenarioDraft, now: Timestamp) -> Result<Self, ScenarioError> {
        let scenario = Self {
            id: self.id,
            owner_id: self.owner_id.clone(),
            name: draft.name,
            description: draft.description,
            enabled: draft.enabled.unwrap_or(self.enabled),
            trigger: draft.trigger,
            conditions: draft.conditions,
            actions: draft.actions,
            created_at: self.created_at,
            updated_at: now,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `actions` is empty ([`ValidationError::NoActions`])
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.actions.is_empty() {
            return Err(ValidationError::NoActions.into());
        }
        Ok(())
    }

    /// Whether an inbound event makes this scenario eligible, before
    /// conditions are looked at.
    #[must_use]
    pub fn is_triggered_by(&self, event: &DeviceEvent) -> bool {
        self.enabled && self.trigger.matches(event)
    }
}

/// Client-supplied scenario fields, used for both creation and replacement.
///
/// Server-owned fields (`id`, timestamps) are not part of the draft, so
/// anything a client sends for them is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioDraft {
    #[serde(default, alias = "user_id")]
    pub owner_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl ScenarioDraft {
    /// Start a draft for `owner_id`.
    #[must_use]
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}
