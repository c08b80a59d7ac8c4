//! Scenario store — the in-memory rule cache, written through to durable storage.
//!
//! Scenarios are cached per owner. Every owner has its own async
//! reader/writer lock, so a write for one owner never blocks readers or
//! writers of another. A mutation holds the owner's write lock across the
//! durable write and only touches the cache once that write succeeded,
//! which keeps both copies identical whenever the lock is free.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;

use scenario_domain::error::{NotFoundError, ScenarioError};
use scenario_domain::id::ScenarioId;
use scenario_domain::scenario::{Scenario, ScenarioDraft};
use scenario_domain::time::now;

use crate::ports::{ScenarioListRepository, StoredList};

type Shard = Arc<RwLock<StoredList>>;

/// Application service owning the scenario cache and its durable copy.
pub struct ScenarioStore<R> {
    repo: R,
    shards: DashMap<String, Shard>,
}

impl<R: ScenarioListRepository> ScenarioStore<R> {
    /// Create an empty store backed by the given repository.
    ///
    /// Call [`load`](Self::load) to populate the cache from storage.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            shards: DashMap::new(),
        }
    }

    /// Repopulate the cache with every owner list found in storage.
    ///
    /// Returns the number of scenarios loaded.
    ///
    /// # Errors
    ///
    /// Returns a storage error if enumerating owners or reading a list fails.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> Result<usize, ScenarioError> {
        let owners = self.repo.owners().await?;
        let mut total = 0;
        for owner_id in owners {
            let list = self.repo.load(&owner_id).await?;
            total += list.scenarios.len();
            self.shards.insert(owner_id, Arc::new(RwLock::new(list)));
        }
        tracing::info!(
            owners = self.shards.len(),
            scenarios = total,
            "scenario cache loaded"
        );
        Ok(total)
    }

    fn existing_shard(&self, owner_id: &str) -> Option<Shard> {
        self.shards.get(owner_id).map(|shard| Arc::clone(shard.value()))
    }

    /// Create a new scenario from client input.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Validation`] if the draft is invalid, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, draft), fields(owner_id = %draft.owner_id, name = %draft.name))]
    pub async fn create(&self, draft: ScenarioDraft) -> Result<Scenario, ScenarioError> {
        let scenario = Scenario::create(draft, now())?;
        let shard = Arc::clone(
            self.shards
                .entry(scenario.owner_id.clone())
                .or_default()
                .value(),
        );

        let mut list = shard.write().await;
        let revision = self
            .repo
            .push(&scenario.owner_id, &scenario, list.revision)
            .await?;
        list.revision = revision;
        list.scenarios.push(scenario.clone());

        tracing::debug!(scenario_id = %scenario.id, revision, "scenario created");
        Ok(scenario)
    }

    /// Look up a single scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::NotFound`] when the owner has no scenario `id`.
    pub async fn get(&self, owner_id: &str, id: ScenarioId) -> Result<Scenario, ScenarioError> {
        self.list_for_owner(owner_id)
            .await
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found(id))
    }

    /// Snapshot of an owner's scenarios, in insertion order.
    pub async fn list_for_owner(&self, owner_id: &str) -> Vec<Scenario> {
        match self.existing_shard(owner_id) {
            Some(shard) => shard.read().await.scenarios.clone(),
            None => Vec::new(),
        }
    }

    /// Replace a scenario, keeping its identity and creation time.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::NotFound`] if absent,
    /// [`ScenarioError::Validation`] if the replacement is invalid, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update(
        &self,
        owner_id: &str,
        id: ScenarioId,
        draft: ScenarioDraft,
    ) -> Result<Scenario, ScenarioError> {
        self.rewrite_one(owner_id, id, |scenarios, index| {
            let replaced = scenarios[index].replaced_by(draft, now())?;
            scenarios[index] = replaced.clone();
            Ok(replaced)
        })
        .await
    }

    /// Enable or disable a scenario.
    ///
    /// Setting the current value again is allowed and still refreshes
    /// `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::NotFound`] if absent, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn set_enabled(
        &self,
        owner_id: &str,
        id: ScenarioId,
        enabled: bool,
    ) -> Result<Scenario, ScenarioError> {
        self.rewrite_one(owner_id, id, |scenarios, index| {
            let scenario = &mut scenarios[index];
            scenario.enabled = enabled;
            scenario.updated_at = now();
            Ok(scenario.clone())
        })
        .await
    }

    /// Delete exactly one scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::NotFound`] if absent, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, owner_id: &str, id: ScenarioId) -> Result<(), ScenarioError> {
        self.rewrite_one(owner_id, id, |scenarios, index| {
            scenarios.remove(index);
            Ok(())
        })
        .await
    }

    /// Apply `change` to a copy of the owner's list, rewrite the durable
    /// list from that copy, then swap it into the cache.
    async fn rewrite_one<T>(
        &self,
        owner_id: &str,
        id: ScenarioId,
        change: impl FnOnce(&mut Vec<Scenario>, usize) -> Result<T, ScenarioError>,
    ) -> Result<T, ScenarioError> {
        let shard = self.existing_shard(owner_id).ok_or_else(|| not_found(id))?;
        let mut list = shard.write().await;
        let index = list
            .scenarios
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| not_found(id))?;

        let mut next = list.scenarios.clone();
        let output = change(&mut next, index)?;
        let revision = self.repo.rewrite(owner_id, &next, list.revision).await?;

        list.revision = revision;
        list.scenarios = next;
        tracing::debug!(scenario_id = %id, revision, "owner list rewritten");
        Ok(output)
    }
}

fn not_found(id: ScenarioId) -> ScenarioError {
    NotFoundError {
        entity: "Scenario",
        id: id.to_string(),
    }
    .into()
}
