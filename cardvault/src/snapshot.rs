//! Fetch-or-reuse snapshot caching for the card set.
//!
//! The snapshot is a timestamped JSON envelope on disk. Once it exists,
//! subsequent runs load it instead of hitting the network; the
//! [`SnapshotPolicy`] decides when an existing file stops counting as valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::api::CardApi;
use crate::card::Card;
use crate::types::CardError;

/// The persisted copy of the last successful API response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub fetched_at: DateTime<Utc>,
    pub cards: Vec<Card>,
}

impl Snapshot {
    /// Wraps a freshly fetched card set with the current timestamp.
    #[must_use]
    pub fn now(cards: Vec<Card>) -> Self {
        Self {
            fetched_at: Utc::now(),
            cards,
        }
    }

    /// Whether the snapshot was fetched within `max_age` of now.
    #[must_use]
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        Utc::now()
            .signed_duration_since(self.fetched_at)
            .to_std()
            .map(|age| age <= max_age)
            .unwrap_or(true)
    }
}

/// Invalidation policy for an existing snapshot file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SnapshotPolicy {
    /// Reuse the file unconditionally once it exists.
    #[default]
    ReuseAlways,
    /// Reuse only snapshots younger than the given age.
    MaxAge(Duration),
    /// Ignore any existing file and fetch again.
    Refresh,
}

/// Result of [`SnapshotStore::ensure`], indicating where the cards came from.
#[derive(Clone, Debug)]
pub struct EnsureOutcome {
    pub cards: Vec<Card>,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
}

/// Filesystem-backed store for the card snapshot.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store persisting to the provided path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a snapshot file is present on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the snapshot from disk.
    pub async fn load(&self) -> Result<Snapshot, CardError> {
        let data = fs::read_to_string(&self.path).await?;
        serde_json::from_str(&data).map_err(|err| CardError::Snapshot(err.to_string()))
    }

    /// Persists a snapshot, creating parent directories as needed.
    ///
    /// Nothing is written until the caller holds a fully parsed card set, so
    /// a failed fetch never leaves a partial file behind.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), CardError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let serialized = serde_json::to_string(snapshot)
            .map_err(|err| CardError::Snapshot(err.to_string()))?;
        fs::write(&self.path, serialized).await?;
        Ok(())
    }

    /// Returns the card set, reusing the snapshot when the policy allows and
    /// fetching (then persisting) otherwise.
    pub async fn ensure(
        &self,
        api: &CardApi,
        policy: SnapshotPolicy,
    ) -> Result<EnsureOutcome, CardError> {
        if self.exists() && !matches!(policy, SnapshotPolicy::Refresh) {
            let snapshot = self.load().await?;
            let reusable = match policy {
                SnapshotPolicy::ReuseAlways => true,
                SnapshotPolicy::MaxAge(max_age) => snapshot.is_fresh(max_age),
                SnapshotPolicy::Refresh => false,
            };
            if reusable {
                tracing::info!(
                    path = %self.path.display(),
                    cards = snapshot.cards.len(),
                    "reusing card snapshot"
                );
                return Ok(EnsureOutcome {
                    fetched_at: snapshot.fetched_at,
                    cards: snapshot.cards,
                    from_cache: true,
                });
            }
            tracing::info!(path = %self.path.display(), "snapshot stale, refetching");
        }

        let cards = api.fetch_all().await?;
        let snapshot = Snapshot::now(cards);
        self.save(&snapshot).await?;
        tracing::info!(
            path = %self.path.display(),
            cards = snapshot.cards.len(),
            "card snapshot written"
        );
        Ok(EnsureOutcome {
            fetched_at: snapshot.fetched_at,
            cards: snapshot.cards,
            from_cache: false,
        })
    }
}
