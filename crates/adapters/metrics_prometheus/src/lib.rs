//! # scenario-adapter-metrics-prometheus
//!
//! [Prometheus](https://docs.rs/prometheus) implementation of `EngineMetrics`.
//!
//! Every instance owns its own [`Registry`], so several engines (or tests)
//! in one process never share counters.

use std::time::Duration;

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use scenario_app::ports::{EngineMetrics, MetricsExposition};
use scenario_domain::id::ScenarioId;

const NAMESPACE: &str = "scenario_engine";

/// Errors raised while registering or rendering metrics.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("prometheus error")]
    Prometheus(#[from] prometheus::Error),

    #[error("metrics output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Engine metrics backed by a private Prometheus registry.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    evaluations: IntCounter,
    evaluation_seconds: Histogram,
    triggered: IntCounterVec,
    actions_executed: IntCounterVec,
    actions_failed: IntCounterVec,
    duplicate_events: IntCounter,
}

impl PrometheusMetrics {
    /// Create and register every engine metric.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if a metric cannot be registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let evaluations = IntCounter::with_opts(
            Opts::new("evaluations_total", "Total number of scenario evaluations")
                .namespace(NAMESPACE),
        )?;
        let evaluation_seconds = Histogram::with_opts(
            HistogramOpts::new("evaluation_seconds", "Time spent evaluating one event")
                .namespace(NAMESPACE),
        )?;
        let triggered = IntCounterVec::new(
            Opts::new("triggered_total", "Total number of scenarios triggered")
                .namespace(NAMESPACE),
            &["scenario_id"],
        )?;
        let actions_executed = IntCounterVec::new(
            Opts::new("actions_executed_total", "Total number of actions executed")
                .namespace(NAMESPACE),
            &["action_type"],
        )?;
        let actions_failed = IntCounterVec::new(
            Opts::new("actions_failed_total", "Total number of actions that failed")
                .namespace(NAMESPACE),
            &["action_type"],
        )?;
        let duplicate_events = IntCounter::with_opts(
            Opts::new(
                "duplicate_events_total",
                "Events ignored because their id was seen recently",
            )
            .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(evaluations.clone()))?;
        registry.register(Box::new(evaluation_seconds.clone()))?;
        registry.register(Box::new(triggered.clone()))?;
        registry.register(Box::new(actions_executed.clone()))?;
        registry.register(Box::new(actions_failed.clone()))?;
        registry.register(Box::new(duplicate_events.clone()))?;

        Ok(Self {
            registry,
            evaluations,
            evaluation_seconds,
            triggered,
            actions_executed,
            actions_failed,
            duplicate_events,
        })
    }
}

impl MetricsExposition for PrometheusMetrics {
    fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    fn render(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(MetricsError::from)?;
        Ok(String::from_utf8(buffer).map_err(MetricsError::from)?)
    }
}

impl EngineMetrics for PrometheusMetrics {
    fn record_evaluation(&self, elapsed: Duration) {
        self.evaluations.inc();
        self.evaluation_seconds.observe(elapsed.as_secs_f64());
    }

    fn scenario_triggered(&self, scenario_id: ScenarioId) {
        let label = scenario_id.to_string();
        self.triggered.with_label_values(&[label.as_str()]).inc();
    }

    fn action_executed(&self, action_type: &'static str) {
        self.actions_executed.with_label_values(&[action_type]).inc();
    }

    fn action_failed(&self, action_type: &'static str) {
        self.actions_failed.with_label_values(&[action_type]).inc();
    }

    fn duplicate_event(&self) {
        self.duplicate_events.inc();
    }
}
