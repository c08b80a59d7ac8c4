//! Execution of a single dispatch: the per-action state machine.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use scenario_domain::id::{DispatchId, ScenarioId};
use scenario_domain::scenario::Action;

use super::Job;
use super::execute::{Execute, ExecutionContext};
use crate::ports::{Collaborators, EngineMetrics};

/// Lifecycle of one action within a dispatch.
///
/// `Pending → Delayed → Executing → Done | Failed`, with `Delayed` skipped
/// for actions without delay. `Pending` and `Delayed` may end in `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Pending,
    Delayed,
    Executing,
    Done,
    Failed,
    Cancelled,
}

impl ActionState {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Delayed | Self::Executing | Self::Cancelled)
                | (Self::Delayed, Self::Executing | Self::Cancelled)
                | (Self::Executing, Self::Done | Self::Failed | Self::Cancelled)
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Delayed => "delayed",
            Self::Executing => "executing",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Why a dispatch stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Shutdown,
    Deadline,
}

/// Final state of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub index: usize,
    pub action_type: &'static str,
    pub state: ActionState,
    pub error: Option<String>,
}

/// What happened to every action of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub dispatch_id: DispatchId,
    pub scenario_id: ScenarioId,
    pub outcomes: Vec<ActionOutcome>,
    pub cancelled: Option<CancelReason>,
}

impl DispatchReport {
    fn count(&self, state: ActionState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    #[must_use]
    pub fn done(&self) -> usize {
        self.count(ActionState::Done)
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(ActionState::Failed)
    }

    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.count(ActionState::Cancelled)
    }
}

/// Cancellation sources of one dispatch.
struct Interrupt {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Interrupt {
    async fn fired(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                () = self.token.cancelled() => CancelReason::Shutdown,
                () = tokio::time::sleep_until(deadline) => CancelReason::Deadline,
            },
            None => {
                self.token.cancelled().await;
                CancelReason::Shutdown
            }
        }
    }
}

/// One action moving through its states.
struct Tracked<'a> {
    index: usize,
    action: &'a Action,
    state: ActionState,
}

impl<'a> Tracked<'a> {
    fn new(index: usize, action: &'a Action) -> Self {
        Self {
            index,
            action,
            state: ActionState::Pending,
        }
    }

    fn advance(&mut self, next: ActionState) {
        debug_assert!(
            self.state.can_become(next),
            "illegal action transition {} -> {next}",
            self.state
        );
        tracing::trace!(index = self.index, from = %self.state, to = %next, "action state");
        self.state = next;
    }

    fn finish(mut self, next: ActionState, error: Option<String>) -> ActionOutcome {
        self.advance(next);
        ActionOutcome {
            index: self.index,
            action_type: self.action.kind.name(),
            state: self.state,
            error,
        }
    }
}

/// Shared, immutable part of every dispatch.
pub(crate) struct Worker<C, M> {
    collaborators: C,
    metrics: M,
    max_duration: Option<Duration>,
}

impl<C: Collaborators, M: EngineMetrics> Worker<C, M> {
    pub(crate) fn new(collaborators: C, metrics: M, max_duration: Option<Duration>) -> Self {
        Self {
            collaborators,
            metrics,
            max_duration,
        }
    }

    /// Run every action of `job` in order until done or interrupted.
    #[tracing::instrument(
        name = "dispatch",
        skip_all,
        fields(
            dispatch_id = %job.id,
            scenario_id = %job.scenario.id,
            event_id = job.event.as_ref().map_or("", |e| e.event_id.as_str()),
        )
    )]
    pub(crate) async fn run(&self, job: Job, token: CancellationToken) -> DispatchReport {
        let interrupt = Interrupt {
            token,
            deadline: self.max_duration.map(|d| Instant::now() + d),
        };
        let scenario = &job.scenario;
        let mut outcomes = Vec::with_capacity(scenario.actions.len());
        let mut cancelled = None;

        for (index, action) in scenario.actions.iter().enumerate() {
            let mut tracked = Tracked::new(index, action);
            if cancelled.is_some() {
                outcomes.push(tracked.finish(ActionState::Cancelled, None));
                continue;
            }

            if action.delay_seconds > 0 {
                tracked.advance(ActionState::Delayed);
                let delay = Duration::from_secs(action.delay_seconds);
                tokio::select! {
                    biased;
                    reason = interrupt.fired() => {
                        cancelled = Some(reason);
                        outcomes.push(tracked.finish(ActionState::Cancelled, None));
                        continue;
                    }
                    () = tokio::time::sleep(delay) => {}
                }
            }

            tracked.advance(ActionState::Executing);
            let ctx = ExecutionContext {
                collaborators: &self.collaborators,
                owner_id: &scenario.owner_id,
            };
            let result = tokio::select! {
                biased;
                reason = interrupt.fired() => {
                    cancelled = Some(reason);
                    outcomes.push(tracked.finish(ActionState::Cancelled, None));
                    continue;
                }
                result = action.kind.execute(ctx) => result,
            };

            match result {
                Ok(()) => {
                    tracing::debug!(index, action = %action, "action executed");
                    self.metrics.action_executed(action.kind.name());
                    outcomes.push(tracked.finish(ActionState::Done, None));
                }
                Err(err) => {
                    tracing::warn!(index, action = %action, error = %err, "action failed");
                    self.metrics.action_failed(action.kind.name());
                    outcomes.push(tracked.finish(ActionState::Failed, Some(err.to_string())));
                }
            }
        }

        let report = DispatchReport {
            dispatch_id: job.id,
            scenario_id: scenario.id,
            outcomes,
            cancelled,
        };
        if let Some(reason) = report.cancelled {
            tracing::info!(
                ?reason,
                done = report.done(),
                failed = report.failed(),
                cancelled = report.cancelled(),
                "dispatch cancelled"
            );
        } else {
            tracing::info!(
                done = report.done(),
                failed = report.failed(),
                "dispatch finished"
            );
        }
        report
    }
}
