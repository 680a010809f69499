//! In-memory store state and its undo journal
//!
//! All mutations go through [`StoreState`] methods that record the previous
//! value of every touched slot. If persisting a mutation fails, the journal is
//! replayed backwards and the state is exactly what it was before.

use autobot_common::{ContentHash, Country};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::models::{IndexKey, SyncLogEntry, UpsertOutcome};
use crate::vehicle::Vehicle;

/// Everything the store owns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreState {
    pub(crate) vehicles: HashMap<ContentHash, Vehicle>,
    pub(crate) reg_index: HashMap<IndexKey, ContentHash>,
    pub(crate) vin_index: HashMap<IndexKey, ContentHash>,
    pub(crate) log: Vec<SyncLogEntry>,
    pub(crate) sync_marks: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Index {
    Reg,
    Vin,
}

impl Index {
    fn label(self) -> &'static str {
        match self {
            Index::Reg => "registration number",
            Index::Vin => "VIN",
        }
    }
}

/// Previous value of one mutated slot
#[derive(Debug)]
pub(crate) enum Undo {
    Vehicle(ContentHash, Option<Vehicle>),
    Index(Index, IndexKey, Option<ContentHash>),
    LogAppended,
    Mark(String, Option<String>),
}

pub(crate) type Journal = Vec<Undo>;

impl StoreState {
    fn index_mut(&mut self, index: Index) -> &mut HashMap<IndexKey, ContentHash> {
        match index {
            Index::Reg => &mut self.reg_index,
            Index::Vin => &mut self.vin_index,
        }
    }

    pub(crate) fn index(&self, index: Index) -> &HashMap<IndexKey, ContentHash> {
        match index {
            Index::Reg => &self.reg_index,
            Index::Vin => &self.vin_index,
        }
    }

    /// Insert or update `vehicle`, whose hash must already be computed
    pub(crate) fn upsert(&mut self, mut vehicle: Vehicle, journal: &mut Journal) -> UpsertOutcome {
        let hash = vehicle.hash();
        let previous = self.vehicles.get(&hash).cloned();

        let mut outcome = match previous {
            Some(ref existing) => {
                vehicle.meta.disabled = existing.meta.disabled;
                UpsertOutcome::Updated
            },
            None => UpsertOutcome::Inserted,
        };
        vehicle.meta.last_updated = Utc::now();

        let country = vehicle.country();
        for (index, value) in [(Index::Reg, &vehicle.reg_nr), (Index::Vin, &vehicle.vin)] {
            if let Some(replaced) = self.point_index(index, country, value, hash, journal) {
                outcome = UpsertOutcome::Overridden { previous: replaced };
            }
        }

        journal.push(Undo::Vehicle(hash, previous));
        self.vehicles.insert(hash, vehicle);
        outcome
    }

    /// Map `(country, value)` to `hash`, returning a different hash it replaced
    fn point_index(
        &mut self,
        index: Index,
        country: Country,
        value: &str,
        hash: ContentHash,
        journal: &mut Journal,
    ) -> Option<ContentHash> {
        if value.trim().is_empty() {
            return None;
        }

        let key = IndexKey::new(country, value);
        let previous = self.index_mut(index).insert(key.clone(), hash);
        let replaced = previous.filter(|old| *old != hash);
        if let Some(old) = replaced {
            warn!(
                key = %key,
                previous = %old,
                current = %hash,
                "{} index entry overridden by a newer record",
                index.label()
            );
        }
        journal.push(Undo::Index(index, key, previous));
        replaced
    }

    pub(crate) fn set_disabled(
        &mut self,
        hash: ContentHash,
        disabled: bool,
        journal: &mut Journal,
    ) -> bool {
        let Some(vehicle) = self.vehicles.get_mut(&hash) else {
            return false;
        };
        let previous = vehicle.clone();
        vehicle.meta.disabled = disabled;
        vehicle.meta.last_updated = Utc::now();
        journal.push(Undo::Vehicle(hash, Some(previous)));
        true
    }

    pub(crate) fn append_log(&mut self, entry: SyncLogEntry, journal: &mut Journal) {
        self.log.push(entry);
        journal.push(Undo::LogAppended);
    }

    pub(crate) fn set_mark(&mut self, provider: &str, filename: &str, journal: &mut Journal) {
        let previous = self
            .sync_marks
            .insert(provider.to_string(), filename.to_string());
        journal.push(Undo::Mark(provider.to_string(), previous));
    }

    /// Replay `journal` backwards, restoring every touched slot
    pub(crate) fn rollback(&mut self, journal: Journal) {
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::Vehicle(hash, Some(vehicle)) => {
                    self.vehicles.insert(hash, vehicle);
                },
                Undo::Vehicle(hash, None) => {
                    self.vehicles.remove(&hash);
                },
                Undo::Index(index, key, Some(hash)) => {
                    self.index_mut(index).insert(key, hash);
                },
                Undo::Index(index, key, None) => {
                    self.index_mut(index).remove(&key);
                },
                Undo::LogAppended => {
                    self.log.pop();
                },
                Undo::Mark(provider, Some(filename)) => {
                    self.sync_marks.insert(provider, filename);
                },
                Undo::Mark(provider, None) => {
                    self.sync_marks.remove(&provider);
                },
            }
        }
    }

    /// Drop index entries whose hash is missing from the primary mapping
    ///
    /// Only loaded snapshots can contain such entries. Returns how many were
    /// removed.
    pub(crate) fn drop_dangling(&mut self) -> usize {
        let vehicles = &self.vehicles;
        let before = self.reg_index.len() + self.vin_index.len();
        self.reg_index.retain(|_, hash| vehicles.contains_key(hash));
        self.vin_index.retain(|_, hash| vehicles.contains_key(hash));
        before - (self.reg_index.len() + self.vin_index.len())
    }
}
