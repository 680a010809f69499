//! Vehicle store
//!
//! An indexed repository of [`Vehicle`] records keyed by content hash, with
//! secondary lookup by `(country, registration number)` and `(country, VIN)`
//! and an append-only synchronization history.
//!
//! One `tokio::sync::RwLock` guards the primary mapping, both secondary
//! indices, the history and the sync marks, so readers never observe a
//! primary write without its index writes. Every mutation is persisted
//! through a [`StoreBackend`] before the write lock is released; when that
//! fails the mutation is undone and a store error is returned.
//!
//! # Example
//!
//! ```no_run
//! use autobot_server::store::VehicleStore;
//! use autobot_common::Country;
//!
//! # async fn example() -> autobot_common::Result<()> {
//! let store = VehicleStore::in_memory();
//! let vehicle = store.lookup_by_reg_nr(Country::Dk, "ab12345", false).await?;
//! println!("{}", vehicle);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod models;
mod state;

pub use backend::{MemoryBackend, SnapshotFileBackend, StoreBackend};
pub use models::{
    BatchOutcome, IndexKey, LogOutcome, StoreStatus, SyncCommit, SyncCounts, SyncLogEntry,
    UpsertOutcome,
};
pub use state::StoreState;

use autobot_common::{AutobotError, ContentHash, Country, Result};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::vehicle::Vehicle;
use state::{Index, Journal};

pub struct VehicleStore {
    state: RwLock<StoreState>,
    backend: Box<dyn StoreBackend>,
}

impl std::fmt::Debug for VehicleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleStore")
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

impl VehicleStore {
    /// Empty store without persistence
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            backend: Box::new(MemoryBackend),
        }
    }

    /// Open a store on `backend`, loading whatever it holds
    pub async fn open(backend: Box<dyn StoreBackend>) -> Result<Self> {
        let mut state = backend.load().await?.unwrap_or_default();

        let dropped = state.drop_dangling();
        if dropped > 0 {
            warn!(dropped, "Removed index entries without a matching vehicle");
        }

        info!(
            backend = backend.name(),
            vehicles = state.vehicles.len(),
            history = state.log.len(),
            "Vehicle store opened"
        );

        Ok(Self {
            state: RwLock::new(state),
            backend,
        })
    }

    /// Snapshot file store at `path`, or an in-memory store when `None`
    pub async fn open_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::open(Box::new(SnapshotFileBackend::new(path))).await,
            None => Ok(Self::in_memory()),
        }
    }

    /// Persist the state or undo `journal`
    async fn commit(&self, state: &mut StoreState, journal: Journal) -> Result<()> {
        if let Err(e) = self.backend.persist(state).await {
            warn!(error = %e, "Persisting store failed, rolling back");
            state.rollback(journal);
            return Err(match e {
                AutobotError::Store(_) => e,
                other => AutobotError::Store(other.to_string()),
            });
        }
        Ok(())
    }

    /// Insert or update one vehicle
    ///
    /// The content hash is recomputed from the business fields. Re-upserting
    /// an existing hash refreshes its metadata but keeps the disabled flag.
    #[instrument(skip(self, vehicle), fields(reg_nr = %vehicle.reg_nr))]
    pub async fn upsert(&self, vehicle: Vehicle) -> Result<UpsertOutcome> {
        let vehicle = vehicle.with_content_hash()?;
        let mut state = self.state.write().await;
        let mut journal = Journal::new();
        let outcome = state.upsert(vehicle, &mut journal);
        self.commit(&mut state, journal).await?;
        Ok(outcome)
    }

    /// Upsert many vehicles and optionally record a sync, all or nothing
    ///
    /// Hashes are validated before the write lock is taken; a vehicle without
    /// a valid hash rejects the whole batch.
    #[instrument(skip(self, vehicles, commit), fields(batch = vehicles.len()))]
    pub async fn upsert_batch(
        &self,
        vehicles: Vec<Vehicle>,
        commit: Option<SyncCommit>,
    ) -> Result<BatchOutcome> {
        let vehicles = vehicles
            .into_iter()
            .map(Vehicle::with_content_hash)
            .collect::<Result<Vec<_>>>()?;

        let mut state = self.state.write().await;
        let mut journal = Journal::with_capacity(vehicles.len() * 3 + 2);
        let mut outcome = BatchOutcome::default();

        for vehicle in vehicles {
            outcome.record(state.upsert(vehicle, &mut journal));
        }

        if let Some(commit) = commit {
            state.set_mark(&commit.provider, &commit.filename, &mut journal);
            state.append_log(commit.entry, &mut journal);
        }

        self.commit(&mut state, journal).await?;

        debug!(
            inserted = outcome.inserted,
            updated = outcome.updated,
            overridden = outcome.overridden,
            "Batch committed"
        );
        Ok(outcome)
    }

    pub async fn lookup_by_hash(&self, hash: ContentHash) -> Result<Vehicle> {
        self.state
            .read()
            .await
            .vehicles
            .get(&hash)
            .cloned()
            .ok_or_else(|| AutobotError::NotFound(format!("no vehicle with hash {}", hash)))
    }

    pub async fn lookup_by_reg_nr(
        &self,
        country: Country,
        reg_nr: &str,
        include_disabled: bool,
    ) -> Result<Vehicle> {
        self.lookup_indexed(Index::Reg, country, reg_nr, include_disabled)
            .await
    }

    pub async fn lookup_by_vin(
        &self,
        country: Country,
        vin: &str,
        include_disabled: bool,
    ) -> Result<Vehicle> {
        self.lookup_indexed(Index::Vin, country, vin, include_disabled)
            .await
    }

    async fn lookup_indexed(
        &self,
        index: Index,
        country: Country,
        value: &str,
        include_disabled: bool,
    ) -> Result<Vehicle> {
        let key = IndexKey::new(country, value);
        let state = self.state.read().await;

        let vehicle = state
            .index(index)
            .get(&key)
            .and_then(|hash| state.vehicles.get(hash))
            .filter(|v| include_disabled || !v.is_disabled());

        vehicle
            .cloned()
            .ok_or_else(|| AutobotError::NotFound(format!("no vehicle for {}", key)))
    }

    pub async fn enable(&self, hash: ContentHash) -> Result<()> {
        self.set_disabled(hash, false).await
    }

    pub async fn disable(&self, hash: ContentHash) -> Result<()> {
        self.set_disabled(hash, true).await
    }

    async fn set_disabled(&self, hash: ContentHash, disabled: bool) -> Result<()> {
        let mut state = self.state.write().await;
        let mut journal = Journal::new();
        if !state.set_disabled(hash, disabled, &mut journal) {
            return Err(AutobotError::NotFound(format!("no vehicle with hash {}", hash)));
        }
        self.commit(&mut state, journal).await?;
        info!(%hash, disabled, "Vehicle visibility changed");
        Ok(())
    }

    /// Remove every vehicle, index entry, history entry and sync mark
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let previous = std::mem::take(&mut *state);

        if let Err(e) = self.backend.persist(&state).await {
            *state = previous;
            return Err(AutobotError::Store(format!("failed to clear store: {}", e)));
        }

        info!(removed = previous.vehicles.len(), "Vehicle store cleared");
        Ok(())
    }

    pub async fn append_log(&self, entry: SyncLogEntry) -> Result<()> {
        let mut state = self.state.write().await;
        let mut journal = Journal::new();
        state.append_log(entry, &mut journal);
        self.commit(&mut state, journal).await
    }

    pub async fn count_log(&self) -> usize {
        self.state.read().await.log.len()
    }

    pub async fn last_log(&self) -> Result<SyncLogEntry> {
        self.state
            .read()
            .await
            .log
            .last()
            .cloned()
            .ok_or_else(|| AutobotError::NotFound("sync history is empty".to_string()))
    }

    /// Filename of the last export successfully synced from `provider`
    pub async fn sync_mark(&self, provider: &str) -> Option<String> {
        self.state.read().await.sync_marks.get(provider).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.vehicles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn reg_index_len(&self) -> usize {
        self.state.read().await.reg_index.len()
    }

    pub async fn vin_index_len(&self) -> usize {
        self.state.read().await.vin_index.len()
    }

    pub async fn status(&self) -> StoreStatus {
        let state = self.state.read().await;
        let last = state.log.last();
        StoreStatus {
            vehicles: state.vehicles.len(),
            history_size: state.log.len(),
            last_status_at: last.map(|e| e.logged_at),
            last_status_message: last.map(|e| e.message.clone()),
        }
    }

    /// Up to `limit` vehicles ordered by country, registration number and VIN
    ///
    /// Disabled vehicles are left out unless `include_disabled` is set.
    pub async fn query(&self, limit: usize, include_disabled: bool) -> Vec<Vehicle> {
        let state = self.state.read().await;
        let mut matches: Vec<&Vehicle> = state
            .vehicles
            .values()
            .filter(|v| include_disabled || !v.is_disabled())
            .collect();
        matches.sort_unstable_by(|a, b| {
            (a.country().code(), &a.reg_nr, &a.vin, a.hash())
                .cmp(&(b.country().code(), &b.reg_nr, &b.vin, b.hash()))
        });
        matches.into_iter().take(limit).cloned().collect()
    }
}
