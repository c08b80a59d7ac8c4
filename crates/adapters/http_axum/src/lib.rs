//! # scenario-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **evaluation API** (`POST /evaluate`) called by the event pipeline
//! - Serve the **management API** (`/scenarios/...`) used to create, read,
//!   replace, toggle, delete and manually fire scenarios
//! - Serve `/health` and the Prometheus `/metrics` exposition
//! - Map application errors onto HTTP status codes and a JSON error body
//!
//! ## Dependency rule
//! Depends on `scenario-app` (for port traits and services) and `scenario-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
