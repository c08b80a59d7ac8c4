//! Metrics port — counters and timings reported by the engine.

use std::sync::Arc;
use std::time::Duration;

use scenario_domain::id::ScenarioId;

/// Sink for engine metrics.
///
/// Implementations must be cheap and non-blocking: they are called on the
/// request path and from dispatch tasks.
pub trait EngineMetrics: Send + Sync {
    /// One `/evaluate` call finished after `elapsed`.
    fn record_evaluation(&self, elapsed: Duration);

    /// A scenario passed trigger and conditions and was handed to the dispatcher.
    fn scenario_triggered(&self, scenario_id: ScenarioId);

    /// An action completed successfully.
    fn action_executed(&self, action_type: &'static str);

    /// An action failed; the remaining actions still run.
    fn action_failed(&self, action_type: &'static str);

    /// An event was dropped because its id was seen recently.
    fn duplicate_event(&self);
}

impl<T: EngineMetrics> EngineMetrics for Arc<T> {
    fn record_evaluation(&self, elapsed: Duration) {
        (**self).record_evaluation(elapsed);
    }

    fn scenario_triggered(&self, scenario_id: ScenarioId) {
        (**self).scenario_triggered(scenario_id);
    }

    fn action_executed(&self, action_type: &'static str) {
        (**self).action_executed(action_type);
    }

    fn action_failed(&self, action_type: &'static str) {
        (**self).action_failed(action_type);
    }

    fn duplicate_event(&self) {
        (**self).duplicate_event();
    }
}

/// Text rendering of the collected metrics, served over HTTP.
pub trait MetricsExposition: Send + Sync {
    /// `Content-Type` of the rendered document.
    fn content_type(&self) -> String;

    /// Render every metric.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded.
    fn render(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: MetricsExposition> MetricsExposition for Arc<T> {
    fn content_type(&self) -> String {
        (**self).content_type()
    }

    fn render(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        (**self).render()
    }
}

/// Metrics sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl EngineMetrics for NoopMetrics {
    fn record_evaluation(&self, _elapsed: Duration) {}
    fn scenario_triggered(&self, _scenario_id: ScenarioId) {}
    fn action_executed(&self, _action_type: &'static str) {}
    fn action_failed(&self, _action_type: &'static str) {}
    fn duplicate_event(&self) {}
}

impl MetricsExposition for NoopMetrics {
    fn content_type(&self) -> String {
        "text/plain; charset=utf-8".to_string()
    }

    fn render(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok(String::new())
    }
}
