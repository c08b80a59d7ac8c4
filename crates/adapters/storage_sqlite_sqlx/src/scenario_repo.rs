//! `SQLite` implementation of [`ScenarioListRepository`].
//!
//! An owner's list lives in `scenario_items`, ordered by `position`; its
//! revision lives in `scenario_owners`. Every write runs in one transaction
//! that first checks the revision the caller expects.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Sqlite, SqlitePool, Transaction};

use scenario_app::ports::{ScenarioListRepository, StoredList};
use scenario_domain::error::{ConflictError, ScenarioError};
use scenario_domain::scenario::Scenario;

use crate::error::StorageError;

struct Wrapper(Scenario);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let body: String = row.try_get("body")?;
        let scenario =
            serde_json::from_str(&body).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self(scenario))
    }
}

/// `SQLite`-backed per-owner scenario lists.
pub struct SqliteScenarioListRepository {
    pool: SqlitePool,
}

impl SqliteScenarioListRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn current_revision(
    tx: &mut Transaction<'_, Sqlite>,
    owner_id: &str,
) -> Result<u64, StorageError> {
    let revision: Option<i64> =
        sqlx::query_scalar("SELECT revision FROM scenario_owners WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(revision.map(u64::try_from).transpose()?.unwrap_or(0))
}

/// Fail unless the stored revision is still `expected`, then bump it.
///
/// The guarded `UPDATE` is the first statement of the transaction so the
/// write lock is taken before anything is read.
async fn advance_revision(
    tx: &mut Transaction<'_, Sqlite>,
    owner_id: &str,
    expected: u64,
) -> Result<u64, ScenarioError> {
    let next = expected + 1;
    let next_db = i64::try_from(next).map_err(StorageError::from)?;
    let expected_db = i64::try_from(expected).map_err(StorageError::from)?;

    let updated = sqlx::query(
        "UPDATE scenario_owners SET revision = ? WHERE owner_id = ? AND revision = ?",
    )
    .bind(next_db)
    .bind(owner_id)
    .bind(expected_db)
    .execute(&mut **tx)
    .await
    .map_err(StorageError::from)?
    .rows_affected();
    if updated == 1 {
        return Ok(next);
    }

    let actual = current_revision(tx, owner_id).await?;
    if expected == 0 && actual == 0 {
        sqlx::query("INSERT INTO scenario_owners (owner_id, revision) VALUES (?, ?)")
            .bind(owner_id)
            .bind(next_db)
            .execute(&mut **tx)
            .await
            .map_err(StorageError::from)?;
        return Ok(next);
    }

    tracing::warn!(owner_id, expected, actual, "revision conflict");
    Err(ConflictError {
        owner_id: owner_id.to_string(),
        expected,
        actual,
    }
    .into())
}

async fn insert_item(
    tx: &mut Transaction<'_, Sqlite>,
    owner_id: &str,
    position: i64,
    scenario: &Scenario,
) -> Result<(), StorageError> {
    let body = serde_json::to_string(scenario)?;
    sqlx::query("INSERT INTO scenario_items (owner_id, position, body) VALUES (?, ?, ?)")
        .bind(owner_id)
        .bind(position)
        .bind(&body)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

impl ScenarioListRepository for SqliteScenarioListRepository {
    async fn owners(&self) -> Result<Vec<String>, ScenarioError> {
        let owners: Vec<String> =
            sqlx::query_scalar("SELECT owner_id FROM scenario_owners ORDER BY owner_id")
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(owners)
    }

    async fn load(&self, owner_id: &str) -> Result<StoredList, ScenarioError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let revision = current_revision(&mut tx, owner_id).await?;
        let rows: Vec<Wrapper> = sqlx::query_as(
            "SELECT body FROM scenario_items WHERE owner_id = ? ORDER BY position",
        )
        .bind(owner_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(StorageError::from)?;
        tx.commit().await.map_err(StorageError::from)?;

        Ok(StoredList {
            revision,
            scenarios: rows.into_iter().map(|w| w.0).collect(),
        })
    }

    async fn push(
        &self,
        owner_id: &str,
        scenario: &Scenario,
        expected_revision: u64,
    ) -> Result<u64, ScenarioError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let revision = advance_revision(&mut tx, owner_id, expected_revision).await?;

        let position: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM scenario_items WHERE owner_id = ?",
        )
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(StorageError::from)?;
        insert_item(&mut tx, owner_id, position, scenario).await?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(revision)
    }

    async fn rewrite(
        &self,
        owner_id: &str,
        scenarios: &[Scenario],
        expected_revision: u64,
    ) -> Result<u64, ScenarioError> {
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;
        let revision = advance_revision(&mut tx, owner_id, expected_revision).await?;

        sqlx::query("DELETE FROM scenario_items WHERE owner_id = ?")
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;
        for (index, scenario) in scenarios.iter().enumerate() {
            let position = i64::try_from(index).map_err(StorageError::from)?;
            insert_item(&mut tx, owner_id, position, scenario).await?;
        }

        tx.commit().await.map_err(StorageError::from)?;
        Ok(revision)
    }
}
