//! Action dispatcher — runs the actions of firing scenarios off the request path.
//!
//! Dispatches are queued on a bounded channel and picked up by a supervisor
//! task that runs at most `max_concurrency` of them at once. Every dispatch
//! gets a child of the dispatcher's root cancellation token and an optional
//! deadline; [`Dispatcher::shutdown`] cancels the root token and waits for
//! running dispatches to wind down.

mod execute;
mod run;

pub use execute::{Execute, ExecutionContext};
pub use run::{ActionOutcome, ActionState, CancelReason, DispatchReport};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use scenario_domain::error::ScenarioError;
use scenario_domain::event::DeviceEvent;
use scenario_domain::id::DispatchId;
use scenario_domain::scenario::Scenario;

use crate::ports::{Collaborators, EngineMetrics};
use run::Worker;

/// Sizing of the dispatch pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Dispatches running at the same time.
    pub max_concurrency: usize,
    /// Dispatches waiting for a free slot before `submit` starts waiting.
    pub queue_capacity: usize,
    /// Upper bound on the wall time of one dispatch, delays included.
    pub max_duration: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 64,
            queue_capacity: 1024,
            max_duration: None,
        }
    }
}

/// One queued unit of work.
#[derive(Debug)]
pub(crate) struct Job {
    pub id: DispatchId,
    pub scenario: Scenario,
    pub event: Option<DeviceEvent>,
}

/// Handle used to submit dispatches and to stop the pool.
#[derive(Debug)]
pub struct Dispatcher {
    queue: mpsc::Sender<Job>,
    root: CancellationToken,
    tracker: TaskTracker,
}

impl Dispatcher {
    /// Spawn the supervisor task and return a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<C, M>(collaborators: C, metrics: M, config: DispatchConfig) -> Self
    where
        C: Collaborators + 'static,
        M: EngineMetrics + 'static,
    {
        let (queue, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let root = CancellationToken::new();
        let tracker = TaskTracker::new();
        let worker = Arc::new(Worker::new(collaborators, metrics, config.max_duration));
        let semaphore = Arc::new(Semaphore::new(config.max_concurrency.max(1)));

        tracker.spawn(supervise(
            receiver,
            worker,
            semaphore,
            tracker.clone(),
            root.clone(),
        ));
        tracing::info!(
            max_concurrency = config.max_concurrency,
            queue_capacity = config.queue_capacity,
            "dispatcher started"
        );

        Self {
            queue,
            root,
            tracker,
        }
    }

    /// Queue the actions of `scenario` for execution.
    ///
    /// Waits for room when the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Unavailable`] once the dispatcher is shutting down.
    pub async fn submit(
        &self,
        scenario: Scenario,
        event: Option<DeviceEvent>,
    ) -> Result<DispatchId, ScenarioError> {
        if self.root.is_cancelled() {
            return Err(ScenarioError::Unavailable("dispatcher is shutting down"));
        }
        let id = DispatchId::new();
        tracing::debug!(dispatch_id = %id, scenario_id = %scenario.id, "dispatch queued");
        self.queue
            .send(Job {
                id,
                scenario,
                event,
            })
            .await
            .map_err(|_| ScenarioError::Unavailable("dispatcher is shutting down"))?;
        Ok(id)
    }

    /// Stop accepting work, cancel running dispatches and wait up to `grace`
    /// for them to finish.
    ///
    /// Returns `false` if some tasks were still running when `grace` elapsed.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        tracing::info!(?grace, "dispatcher shutting down");
        self.root.cancel();
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            tracing::info!("dispatcher stopped");
            true
        } else {
            tracing::warn!(
                remaining = self.tracker.len(),
                "dispatcher grace period elapsed"
            );
            false
        }
    }
}

async fn supervise<C, M>(
    mut receiver: mpsc::Receiver<Job>,
    worker: Arc<Worker<C, M>>,
    semaphore: Arc<Semaphore>,
    tracker: TaskTracker,
    root: CancellationToken,
) where
    C: Collaborators + 'static,
    M: EngineMetrics + 'static,
{
    loop {
        let job = tokio::select! {
            () = root.cancelled() => break,
            job = receiver.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };
        let permit = tokio::select! {
            () = root.cancelled() => {
                tracing::debug!(dispatch_id = %job.id, "dispatch dropped on shutdown");
                break;
            }
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let worker = Arc::clone(&worker);
        let token = root.child_token();
        tracker.spawn(async move {
            let _permit = permit;
            worker.run(job, token).await;
        });
    }

    receiver.close();
    let mut dropped = 0_usize;
    while receiver.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        tracing::warn!(dropped, "queued dispatches discarded on shutdown");
    }
}
