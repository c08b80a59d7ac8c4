//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ScenarioError`] via `#[from]` at the port boundary.

/// Top-level error returned by domain and application operations.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("storage conflict")]
    StorageConflict(#[from] ConflictError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The engine is shutting down and no longer accepts work.
    #[error("service unavailable: {0}")]
    Unavailable(&'static str),
}

/// A domain invariant was violated by caller-supplied data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("owner_id is required")]
    MissingOwner,

    #[error("name is required")]
    EmptyName,

    #[error("at least one action is required")]
    NoActions,
}

/// The requested record does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// The durable copy of an owner's scenarios moved under our feet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("scenarios of owner {owner_id} changed concurrently (expected revision {expected}, found {actual})")]
pub struct ConflictError {
    pub owner_id: String,
    pub expected: u64,
    pub actual: u64,
}
