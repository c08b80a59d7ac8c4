//! # scenario-domain
//!
//! Pure domain model for the scenario (automation rule) engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Scenarios** (trigger → conditions → actions rules owned by a principal)
//! - Define **Device events** (the inbound facts scenarios are evaluated against)
//! - Contain the pure decision logic: trigger matching and condition evaluation
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod event;
pub mod scenario;
