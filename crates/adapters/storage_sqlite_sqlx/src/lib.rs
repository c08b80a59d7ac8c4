//! # scenario-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement `ScenarioListRepository` defined in `scenario-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Store every scenario as one JSON document per list element
//!
//! ## Dependency rule
//! Depends on `scenario-app` (for port traits) and `scenario-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod scenario_repo;

pub use pool::{Config, Database};
pub use scenario_repo::SqliteScenarioListRepository;
