//! Evaluation pipeline — turns an inbound device event into dispatches.
//!
//! For each event the owner's cached scenarios are matched against the
//! trigger, the conditions of the survivors are evaluated against the event
//! and a device-status snapshot, and every scenario that passes is handed
//! to the [`Dispatcher`]. Evaluation never waits for actions to run.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;

use scenario_domain::error::ScenarioError;
use scenario_domain::event::DeviceEvent;
use scenario_domain::id::{DispatchId, ScenarioId};
use scenario_domain::scenario::{DeviceStates, Scenario, holds};

use crate::dedup::EventDeduplicator;
use crate::dispatcher::Dispatcher;
use crate::ports::{DeviceStateReader, EngineMetrics, ScenarioListRepository};
use crate::services::scenario_store::ScenarioStore;

/// Result of evaluating one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationOutcome {
    /// Scenarios of the owner that were looked at, disabled ones included.
    pub evaluated_count: usize,
    pub triggered_count: usize,
    pub event_id: String,
    /// The event id was seen within the de-duplication window; nothing ran.
    pub duplicate: bool,
    pub triggered: Vec<ScenarioId>,
}

/// Matches events against scenarios and submits the firing ones.
pub struct Evaluator<R, S, M> {
    store: Arc<ScenarioStore<R>>,
    states: S,
    dispatcher: Arc<Dispatcher>,
    metrics: M,
    dedup: EventDeduplicator,
}

impl<R, S, M> Evaluator<R, S, M>
where
    R: ScenarioListRepository,
    S: DeviceStateReader,
    M: EngineMetrics,
{
    /// Create an evaluator with de-duplication disabled.
    pub fn new(
        store: Arc<ScenarioStore<R>>,
        states: S,
        dispatcher: Arc<Dispatcher>,
        metrics: M,
    ) -> Self {
        Self {
            store,
            states,
            dispatcher,
            metrics,
            dedup: EventDeduplicator::new(Duration::ZERO),
        }
    }

    /// Drop events whose id was already seen within `window`.
    #[must_use]
    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup = EventDeduplicator::new(window);
        self
    }

    /// Evaluate `event` against every scenario of its owner.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Unavailable`] if the dispatcher stopped
    /// accepting work.
    #[tracing::instrument(
        skip(self, event),
        fields(
            owner_id = %event.owner_id,
            device_id = %event.device_id,
            event_type = %event.event_type,
            event_id = %event.event_id,
        )
    )]
    pub async fn evaluate(&self, event: DeviceEvent) -> Result<EvaluationOutcome, ScenarioError> {
        if !self.dedup.first_sighting(&event.event_id) {
            tracing::info!("duplicate event ignored");
            self.metrics.duplicate_event();
            return Ok(EvaluationOutcome {
                evaluated_count: 0,
                triggered_count: 0,
                event_id: event.event_id,
                duplicate: true,
                triggered: Vec::new(),
            });
        }

        let started = Instant::now();
        let scenarios = self.store.list_for_owner(&event.owner_id).await;
        let evaluated_count = scenarios.len();

        let candidates: Vec<Scenario> = scenarios
            .into_iter()
            .filter(|s| s.is_triggered_by(&event))
            .collect();
        let states = self.snapshot(&candidates, &event).await;

        let mut triggered = Vec::new();
        for scenario in candidates {
            if !holds(&scenario.conditions, &event, &states) {
                tracing::debug!(scenario_id = %scenario.id, "conditions not met");
                continue;
            }
            let scenario_id = scenario.id;
            let dispatch_id = self.dispatcher.submit(scenario, Some(event.clone())).await?;
            tracing::info!(%scenario_id, %dispatch_id, "scenario triggered");
            self.metrics.scenario_triggered(scenario_id);
            triggered.push(scenario_id);
        }

        self.metrics.record_evaluation(started.elapsed());
        tracing::debug!(evaluated_count, triggered_count = triggered.len(), "event evaluated");
        Ok(EvaluationOutcome {
            evaluated_count,
            triggered_count: triggered.len(),
            event_id: event.event_id,
            duplicate: false,
            triggered,
        })
    }

    /// Fire a scenario directly, bypassing trigger and conditions.
    ///
    /// Works for disabled scenarios too.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::NotFound`] if the scenario does not exist, or
    /// [`ScenarioError::Unavailable`] if the dispatcher stopped.
    #[tracing::instrument(skip(self))]
    pub async fn trigger_manually(
        &self,
        owner_id: &str,
        id: ScenarioId,
    ) -> Result<DispatchId, ScenarioError> {
        let scenario = self.store.get(owner_id, id).await?;
        let dispatch_id = self.dispatcher.submit(scenario, None).await?;
        tracing::info!(%dispatch_id, "scenario triggered manually");
        self.metrics.scenario_triggered(id);
        Ok(dispatch_id)
    }

    /// Fetch the status of every device a candidate's conditions read.
    ///
    /// Lookup failures are logged and leave the device out of the
    /// snapshot, so conditions on it do not hold.
    async fn snapshot(&self, candidates: &[Scenario], event: &DeviceEvent) -> DeviceStates {
        let devices: BTreeSet<&str> = candidates
            .iter()
            .flat_map(|s| &s.conditions)
            .filter_map(|c| c.required_device(event))
            .collect();

        let lookups = devices.into_iter().map(|device_id| async move {
            (device_id, self.states.device_status(device_id).await)
        });

        let mut states = DeviceStates::new();
        for (device_id, result) in join_all(lookups).await {
            match result {
                Ok(Some(status)) => {
                    states.insert(device_id.to_string(), status);
                }
                Ok(None) => tracing::warn!(device_id, "device status unknown"),
                Err(err) => {
                    tracing::warn!(device_id, error = %err, "device status lookup failed");
                }
            }
        }
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::DispatchConfig;
    use crate::test_support::{Call, CountingMetrics, InMemoryListRepo, SpyCollaborators};
    use scenario_domain::scenario::{Action, Condition, Operator, ScenarioDraft, Trigger};
    use serde_json::json;

    type TestEvaluator =
        Evaluator<Arc<InMemoryListRepo>, Arc<SpyCollaborators>, Arc<CountingMetrics>>;

    struct Harness {
        store: Arc<ScenarioStore<Arc<InMemoryListRepo>>>,
        spy: Arc<SpyCollaborators>,
        metrics: Arc<CountingMetrics>,
        evaluator: TestEvaluator,
    }

    fn harness_with(spy: SpyCollaborators) -> Harness {
        let store = Arc::new(ScenarioStore::new(Arc::new(InMemoryListRepo::default())));
        let spy = Arc::new(spy);
        let metrics = Arc::new(CountingMetrics::default());
        let dispatcher = Arc::new(Dispatcher::start(
            Arc::clone(&spy),
            Arc::clone(&metrics),
            DispatchConfig::default(),
        ));
        let evaluator = Evaluator::new(
            Arc::clone(&store),
            Arc::clone(&spy),
            dispatcher,
            Arc::clone(&metrics),
        );
        Harness {
            store,
            spy,
            metrics,
            evaluator,
        }
    }

    fn harness() -> Harness {
        harness_with(SpyCollaborators::default())
    }

    fn motion_light() -> ScenarioDraft {
        ScenarioDraft::new("u1", "Hall light")
            .trigger(Trigger::device_event("d1", "motion_detected"))
            .action(Action::device_command("d2", "turn_on"))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn should_trigger_matching_scenario_and_send_command() {
        let h = harness();
        h.store.create(motion_light()).await.unwrap();

        let outcome = h
            .evaluator
            .evaluate(DeviceEvent::new("u1", "d1", "motion_detected"))
            .await
            .unwrap();
        settle().await;

        assert_eq!(outcome.evaluated_count, 1);
        assert_eq!(outcome.triggered_count, 1);
        assert_eq!(
            h.spy.calls(),
            [Call::Command {
                device_id: "d2".to_string(),
                command: "turn_on".to_string()
            }]
        );
        assert_eq!(*h.metrics.evaluations.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_trigger_for_other_device() {
        let h = harness();
        h.store.create(motion_light()).await.unwrap();

        let outcome = h
            .evaluator
            .evaluate(DeviceEvent::new("u1", "d9", "motion_detected"))
            .await
            .unwrap();
        settle().await;

        assert_eq!(outcome.evaluated_count, 1);
        assert_eq!(outcome.triggered_count, 0);
        assert!(h.spy.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_only_look_at_event_owner_scenarios() {
        let h = harness();
        h.store.create(motion_light()).await.unwrap();

        let outcome = h
            .evaluator
            .evaluate(DeviceEvent::new("u2", "d1", "motion_detected"))
            .await
            .unwrap();
        assert_eq!(outcome.evaluated_count, 0);
        assert_eq!(outcome.triggered_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_apply_value_compare_condition() {
        let h = harness();
        h.store
            .create(
                ScenarioDraft::new("u1", "Too hot")
                    .trigger(Trigger::device_event("t1", ""))
                    .condition(Condition::value_compare("temp", Operator::Gt, json!(75)))
                    .action(Action::device_command("fan", "turn_on")),
            )
            .await
            .unwrap();

        let hot = DeviceEvent::new("u1", "t1", "reading").with_property("temp", json!(80));
        let cool = DeviceEvent::new("u1", "t1", "reading").with_property("temp", json!(60));
        let missing = DeviceEvent::new("u1", "t1", "reading");

        assert_eq!(h.evaluator.evaluate(hot).await.unwrap().triggered_count, 1);
        assert_eq!(h.evaluator.evaluate(cool).await.unwrap().triggered_count, 0);
        assert_eq!(
            h.evaluator.evaluate(missing).await.unwrap().triggered_count,
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_count_disabled_scenarios_as_evaluated_but_not_trigger_them() {
        let h = harness();
        let created = h.store.create(motion_light()).await.unwrap();
        h.store.set_enabled("u1", created.id, false).await.unwrap();

        let event = DeviceEvent::new("u1", "d1", "motion_detected");
        let outcome = h.evaluator.evaluate(event.clone()).await.unwrap();
        assert_eq!(outcome.evaluated_count, 1);
        assert_eq!(outcome.triggered_count, 0);

        h.store.set_enabled("u1", created.id, true).await.unwrap();
        let outcome = h.evaluator.evaluate(event).await.unwrap();
        assert_eq!(outcome.triggered_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_resolve_device_state_from_snapshot() {
        let h = harness_with(
            SpyCollaborators::default().with_status("lamp", json!({"power": "off"})),
        );
        h.store
            .create(
                motion_light()
                    .condition(Condition::device_state("lamp", "power", Operator::Eq, json!("off"))),
            )
            .await
            .unwrap();
        h.store
            .create(
                ScenarioDraft::new("u1", "Unknown device")
                    .trigger(Trigger::device_event("d1", "motion_detected"))
                    .condition(Condition::device_state("ghost", "power", Operator::Eq, json!("off")))
                    .action(Action::device_command("d3", "turn_on")),
            )
            .await
            .unwrap();

        let outcome = h
            .evaluator
            .evaluate(DeviceEvent::new("u1", "d1", "motion_detected"))
            .await
            .unwrap();
        assert_eq!(outcome.evaluated_count, 2);
        assert_eq!(outcome.triggered_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_trigger_when_device_status_lookup_fails() {
        let h = harness_with(
            SpyCollaborators::default()
                .with_status("lamp", json!({"power": "off"}))
                .failing_status_for("lamp"),
        );
        h.store
            .create(
                motion_light()
                    .condition(Condition::device_state("lamp", "power", Operator::Eq, json!("off"))),
            )
            .await
            .unwrap();

        let outcome = h
            .evaluator
            .evaluate(DeviceEvent::new("u1", "d1", "motion_detected"))
            .await
            .unwrap();
        settle().await;

        assert_eq!(outcome.evaluated_count, 1);
        assert_eq!(outcome.triggered_count, 0);
        assert!(h.spy.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_look_up_device_statuses_concurrently() {
        let h = harness_with(
            SpyCollaborators::default()
                .with_status("lamp", json!({"power": "off"}))
                .with_status("door", json!({"state": "closed"}))
                .with_status_delay(Duration::from_secs(5)),
        );
        h.store
            .create(
                motion_light()
                    .condition(Condition::device_state("lamp", "power", Operator::Eq, json!("off")))
                    .condition(Condition::device_state(
                        "door",
                        "state",
                        Operator::Eq,
                        json!("closed"),
                    )),
            )
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        let outcome = h
            .evaluator
            .evaluate(DeviceEvent::new("u1", "d1", "motion_detected"))
            .await
            .unwrap();

        assert_eq!(outcome.triggered_count, 1);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn should_trigger_again_on_replay_when_dedup_disabled() {
        let h = harness();
        h.store.create(motion_light()).await.unwrap();
        let event = DeviceEvent::new("u1", "d1", "motion_detected").with_event_id("e1");

        h.evaluator.evaluate(event.clone()).await.unwrap();
        let second = h.evaluator.evaluate(event).await.unwrap();
        settle().await;

        assert!(!second.duplicate);
        assert_eq!(h.spy.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn should_skip_duplicate_event_within_window() {
        let mut h = harness();
        h.evaluator = h.evaluator.with_dedup_window(Duration::from_secs(60));
        h.store.create(motion_light()).await.unwrap();
        let event = DeviceEvent::new("u1", "d1", "motion_detected").with_event_id("e1");

        h.evaluator.evaluate(event.clone()).await.unwrap();
        let second = h.evaluator.evaluate(event).await.unwrap();
        settle().await;

        assert!(second.duplicate);
        assert_eq!(second.event_id, "e1");
        assert_eq!(second.triggered_count, 0);
        assert_eq!(h.spy.calls().len(), 1);
        assert_eq!(*h.metrics.duplicates.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_trigger_disabled_scenario_manually() {
        let h = harness();
        let created = h.store.create(motion_light()).await.unwrap();
        h.store.set_enabled("u1", created.id, false).await.unwrap();

        h.evaluator.trigger_manually("u1", created.id).await.unwrap();
        settle().await;

        assert_eq!(h.spy.calls().len(), 1);
        assert_eq!(*h.metrics.triggered.lock().unwrap(), [created.id]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_return_not_found_for_unknown_manual_trigger() {
        let h = harness();
        let result = h.evaluator.trigger_manually("u1", ScenarioId::new()).await;
        assert!(matches!(result, Err(ScenarioError::NotFound(_))));
    }
}
