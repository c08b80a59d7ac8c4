//! Scenario list repository port — durable, per-owner ordered lists.
//!
//! Each owner's scenarios live as one ordered list under a key derived from
//! the owner id. Every list carries a revision that increases on each write;
//! writers pass the revision they last observed and get
//! [`ScenarioError::StorageConflict`] back if somebody else wrote in between.

use std::future::Future;
use std::sync::Arc;

use scenario_domain::error::ScenarioError;
use scenario_domain::scenario::Scenario;

/// Full content of one owner's durable list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredList {
    /// Revision of the list; `0` for an owner that was never written.
    pub revision: u64,
    pub scenarios: Vec<Scenario>,
}

/// Durable storage for per-owner scenario lists.
pub trait ScenarioListRepository {
    /// Enumerate every owner that has a stored list.
    fn owners(&self) -> impl Future<Output = Result<Vec<String>, ScenarioError>> + Send;

    /// Read an owner's whole list, in order.
    fn load(&self, owner_id: &str)
    -> impl Future<Output = Result<StoredList, ScenarioError>> + Send;

    /// Append one scenario to the end of an owner's list.
    ///
    /// Returns the new revision.
    fn push(
        &self,
        owner_id: &str,
        scenario: &Scenario,
        expected_revision: u64,
    ) -> impl Future<Output = Result<u64, ScenarioError>> + Send;

    /// Atomically replace an owner's whole list.
    ///
    /// Returns the new revision.
    fn rewrite(
        &self,
        owner_id: &str,
        scenarios: &[Scenario],
        expected_revision: u64,
    ) -> impl Future<Output = Result<u64, ScenarioError>> + Send;
}

impl<T: ScenarioListRepository + Send + Sync> ScenarioListRepository for Arc<T> {
    fn owners(&self) -> impl Future<Output = Result<Vec<String>, ScenarioError>> + Send {
        (**self).owners()
    }

    fn load(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<StoredList, ScenarioError>> + Send {
        (**self).load(owner_id)
    }

    fn push(
        &self,
        owner_id: &str,
        scenario: &Scenario,
        expected_revision: u64,
    ) -> impl Future<Output = Result<u64, ScenarioError>> + Send {
        (**self).push(owner_id, scenario, expected_revision)
    }

    fn rewrite(
        &self,
        owner_id: &str,
        scenarios: &[Scenario],
        expected_revision: u64,
    ) -> impl Future<Output = Result<u64, ScenarioError>> + Send {
        (**self).rewrite(owner_id, scenarios, expected_revision)
    }
}
