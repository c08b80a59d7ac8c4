//! # scenario-adapter-http-reqwest
//!
//! Outbound HTTP adapter using [reqwest](https://docs.rs/reqwest).
//!
//! ## Responsibilities
//! - Implement `Collaborators` (device commands, notifications, webhooks)
//! - Implement `DeviceStateReader` against the device registry status endpoint
//! - Apply one client-level timeout to every outbound call
//!
//! ## Dependency rule
//! Depends on `scenario-app` (for port traits) and `scenario-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod client;
pub mod config;
pub mod error;

pub use client::HttpCollaborators;
pub use config::Config;
pub use error::HttpClientError;
