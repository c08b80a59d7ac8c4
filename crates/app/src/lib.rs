//! # scenario-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ScenarioListRepository` — durable per-owner scenario lists
//!   - `Collaborators` — device commands, notifications, webhooks
//!   - `DeviceStateReader` — live device status for `device_state` conditions
//!   - `EngineMetrics` — counters and timings
//! - Provide the use-cases driving adapters call into:
//!   - `ScenarioStore` — cached scenario CRUD, written through to storage
//!   - `Evaluator` — match events against scenarios and hand firing ones off
//!   - `Dispatcher` — bounded, cancellable execution of action sequences
//!
//! ## Dependency rule
//! Depends on `scenario-domain` only (plus `tokio` for sync and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dedup;
pub mod dispatcher;
pub mod evaluator;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;
