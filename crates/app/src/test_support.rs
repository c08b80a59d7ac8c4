//! In-memory port implementations shared by the unit tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use scenario_domain::error::{ConflictError, ScenarioError};
use scenario_domain::event::Payload;
use scenario_domain::id::ScenarioId;
use scenario_domain::scenario::Scenario;
use serde_json::Value;

use crate::ports::{
    Collaborators, DeviceStateReader, DownstreamError, EngineMetrics, Notification,
    ScenarioListRepository, StoredList,
};

// ── In-memory list repo ──────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryListRepo {
    lists: Mutex<HashMap<String, StoredList>>,
}

impl InMemoryListRepo {
    fn check(list: &StoredList, owner_id: &str, expected: u64) -> Result<(), ScenarioError> {
        if list.revision == expected {
            Ok(())
        } else {
            Err(ConflictError {
                owner_id: owner_id.to_string(),
                expected,
                actual: list.revision,
            }
            .into())
        }
    }
}

impl ScenarioListRepository for InMemoryListRepo {
    fn owners(&self) -> impl Future<Output = Result<Vec<String>, ScenarioError>> + Send {
        let lists = self.lists.lock().unwrap();
        let r: Vec<_> = lists.keys().cloned().collect();
        async { Ok(r) }
    }

    fn load(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<StoredList, ScenarioError>> + Send {
        let lists = self.lists.lock().unwrap();
        let r = lists.get(owner_id).cloned().unwrap_or_default();
        async { Ok(r) }
    }

    fn push(
        &self,
        owner_id: &str,
        scenario: &Scenario,
        expected_revision: u64,
    ) -> impl Future<Output = Result<u64, ScenarioError>> + Send {
        let mut lists = self.lists.lock().unwrap();
        let list = lists.entry(owner_id.to_string()).or_default();
        let r = Self::check(list, owner_id, expected_revision).map(|()| {
            list.scenarios.push(scenario.clone());
            list.revision += 1;
            list.revision
        });
        async { r }
    }

    fn rewrite(
        &self,
        owner_id: &str,
        scenarios: &[Scenario],
        expected_revision: u64,
    ) -> impl Future<Output = Result<u64, ScenarioError>> + Send {
        let mut lists = self.lists.lock().unwrap();
        let list = lists.entry(owner_id.to_string()).or_default();
        let r = Self::check(list, owner_id, expected_revision).map(|()| {
            list.scenarios = scenarios.to_vec();
            list.revision += 1;
            list.revision
        });
        async { r }
    }
}

// ── Spy collaborators ────────────────────────────────────────────

/// One side effect observed by [`SpyCollaborators`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Command { device_id: String, command: String },
    Notify(Notification),
    Webhook { url: String, body: Value },
}

/// Records every call, answers device status lookups from a fixed table
/// and fails commands for devices listed in `failing`.
#[derive(Default)]
pub struct SpyCollaborators {
    pub calls: Mutex<Vec<(tokio::time::Instant, Call)>>,
    pub statuses: Mutex<HashMap<String, Payload>>,
    pub failing: Mutex<Vec<String>>,
    pub failing_status: Mutex<Vec<String>>,
    pub status_delay: Mutex<Duration>,
}

impl SpyCollaborators {
    pub fn with_status(self, device_id: &str, status: Value) -> Self {
        if let Value::Object(map) = status {
            self.statuses
                .lock()
                .unwrap()
                .insert(device_id.to_string(), map);
        }
        self
    }

    pub fn failing_for(self, device_id: &str) -> Self {
        self.failing.lock().unwrap().push(device_id.to_string());
        self
    }

    pub fn failing_status_for(self, device_id: &str) -> Self {
        self.failing_status
            .lock()
            .unwrap()
            .push(device_id.to_string());
        self
    }

    pub fn with_status_delay(self, delay: Duration) -> Self {
        *self.status_delay.lock().unwrap() = delay;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn timed_calls(&self) -> Vec<(tokio::time::Instant, Call)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .unwrap()
            .push((tokio::time::Instant::now(), call));
    }
}

impl Collaborators for SpyCollaborators {
    fn send_device_command(
        &self,
        device_id: &str,
        command: &str,
        _params: &Payload,
    ) -> impl Future<Output = Result<(), DownstreamError>> + Send {
        self.record(Call::Command {
            device_id: device_id.to_string(),
            command: command.to_string(),
        });
        let failing = self.failing.lock().unwrap().iter().any(|d| d == device_id);
        let target = format!("device {device_id}");
        async move {
            if failing {
                Err(DownstreamError::Status {
                    target,
                    status: 500,
                })
            } else {
                Ok(())
            }
        }
    }

    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), DownstreamError>> + Send {
        self.record(Call::Notify(notification));
        async { Ok(()) }
    }

    fn call_webhook(
        &self,
        url: &str,
        body: &Value,
    ) -> impl Future<Output = Result<(), DownstreamError>> + Send {
        self.record(Call::Webhook {
            url: url.to_string(),
            body: body.clone(),
        });
        async { Ok(()) }
    }
}

impl DeviceStateReader for SpyCollaborators {
    fn device_status(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Option<Payload>, DownstreamError>> + Send {
        let status = self.statuses.lock().unwrap().get(device_id).cloned();
        let failing = self
            .failing_status
            .lock()
            .unwrap()
            .iter()
            .any(|d| d == device_id);
        let delay = *self.status_delay.lock().unwrap();
        let target = format!("device {device_id}");
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if failing {
                return Err(DownstreamError::Status {
                    target,
                    status: 503,
                });
            }
            Ok(status)
        }
    }
}

// ── Counting metrics ─────────────────────────────────────────────

#[derive(Default)]
pub struct CountingMetrics {
    pub evaluations: Mutex<u32>,
    pub triggered: Mutex<Vec<ScenarioId>>,
    pub executed: Mutex<Vec<&'static str>>,
    pub failed: Mutex<Vec<&'static str>>,
    pub duplicates: Mutex<u32>,
}

impl EngineMetrics for CountingMetrics {
    fn record_evaluation(&self, _elapsed: std::time::Duration) {
        *self.evaluations.lock().unwrap() += 1;
    }

    fn scenario_triggered(&self, scenario_id: ScenarioId) {
        self.triggered.lock().unwrap().push(scenario_id);
    }

    fn action_executed(&self, action_type: &'static str) {
        self.executed.lock().unwrap().push(action_type);
    }

    fn action_failed(&self, action_type: &'static str) {
        self.failed.lock().unwrap().push(action_type);
    }

    fn duplicate_event(&self) {
        *self.duplicates.lock().unwrap() += 1;
    }
}
