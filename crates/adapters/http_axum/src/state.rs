//! Shared application state for axum handlers.

use std::sync::Arc;

use scenario_app::evaluator::Evaluator;
use scenario_app::services::scenario_store::ScenarioStore;

/// Application state shared across all axum handlers.
///
/// Generic over the scenario repository, the device state reader and the
/// metrics sink to avoid dynamic dispatch. `Clone` is implemented manually
/// so the underlying types themselves do not need to be `Clone` — only the
/// `Arc` wrappers are cloned.
pub struct AppState<R, S, M> {
    /// Scenario CRUD, backed by the cache.
    pub store: Arc<ScenarioStore<R>>,
    /// Event evaluation and manual triggering.
    pub evaluator: Arc<Evaluator<R, S, Arc<M>>>,
    /// Metrics sink, rendered by `/metrics`.
    pub metrics: Arc<M>,
}

impl<R, S, M> Clone for AppState<R, S, M> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            evaluator: Arc::clone(&self.evaluator),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<R, S, M> AppState<R, S, M> {
    /// Create a new application state from pre-wrapped `Arc` services.
    pub fn new(
        store: Arc<ScenarioStore<R>>,
        evaluator: Arc<Evaluator<R, S, Arc<M>>>,
        metrics: Arc<M>,
    ) -> Self {
        Self {
            store,
            evaluator,
            metrics,
        }
    }
}
