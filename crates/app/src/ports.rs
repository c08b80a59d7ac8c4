//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod collaborators;
pub mod metrics;
pub mod scenario_repo;

pub use collaborators::{Collaborators, DeviceStateReader, DownstreamError, Notification};
pub use metrics::{EngineMetrics, MetricsExposition, NoopMetrics};
pub use scenario_repo::{ScenarioListRepository, StoredList};
