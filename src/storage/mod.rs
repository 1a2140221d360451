//! EP record storage.
//!
//! Defines the `EpStore` trait: replace every record of a gameweek in one
//! step, and sum a player's records over a gameweek range. Two backends:
//! an in-memory map and a JSON file (see `json`).

pub mod json;

use std::collections::{BTreeMap, HashMap};

#[cfg(test)]
use mockall::automock;

use crate::types::{EpRecord, Gameweek, PlayerId, SquadError};

pub use json::JsonEpStore;

/// Keyed store of EP records, unique per `(player, gameweek)`.
#[cfg_attr(test, automock)]
pub trait EpStore {
    /// Atomically replace all records of `gameweek` with `records`.
    /// Returns the number of records now stored for that gameweek.
    fn replace_gameweek(&mut self, gameweek: Gameweek, records: Vec<EpRecord>) -> Result<usize, SquadError>;

    /// Records of one gameweek, ordered by player id.
    fn records_for(&self, gameweek: Gameweek) -> Vec<EpRecord>;

    /// Sum of a player's EP over `[start, end]`. Missing gameweeks count as 0.
    fn sum_for_player(&self, player: PlayerId, start: Gameweek, end: Gameweek) -> f64;

    /// Per-player EP sums over `[start, end]`.
    fn horizon_totals(&self, start: Gameweek, end: Gameweek) -> HashMap<PlayerId, f64>;

    /// Total number of stored records.
    fn record_count(&self) -> usize;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryEpStore {
    by_gameweek: BTreeMap<Gameweek, BTreeMap<PlayerId, EpRecord>>,
}

impl MemoryEpStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_records(records: Vec<EpRecord>) -> Self {
        let mut store = Self::default();
        for rec in records {
            store
                .by_gameweek
                .entry(rec.gameweek)
                .or_default()
                .insert(rec.player, rec);
        }
        store
    }

    pub(crate) fn all_records(&self) -> Vec<EpRecord> {
        self.by_gameweek
            .values()
            .flat_map(|gw| gw.values().cloned())
            .collect()
    }

    /// Gameweeks that currently hold records.
    pub fn gameweeks(&self) -> Vec<Gameweek> {
        self.by_gameweek.keys().copied().collect()
    }
}

/// Build the replacement map for a gameweek, rejecting records that belong
/// to a different gameweek. Later duplicates of a player win.
pub(crate) fn build_gameweek(
    gameweek: Gameweek,
    records: Vec<EpRecord>,
) -> Result<BTreeMap<PlayerId, EpRecord>, SquadError> {
    if let Some(stray) = records.iter().find(|r| r.gameweek != gameweek) {
        return Err(SquadError::Storage(format!(
            "record for player {} has gameweek {} while replacing gameweek {gameweek}",
            stray.player, stray.gameweek
        )));
    }
    Ok(records.into_iter().map(|r| (r.player, r)).collect())
}

impl EpStore for MemoryEpStore {
    fn replace_gameweek(&mut self, gameweek: Gameweek, records: Vec<EpRecord>) -> Result<usize, SquadError> {
        let fresh = build_gameweek(gameweek, records)?;
        let count = fresh.len();
        if fresh.is_empty() {
            self.by_gameweek.remove(&gameweek);
        } else {
            self.by_gameweek.insert(gameweek, fresh);
        }
        Ok(count)
    }

    fn records_for(&self, gameweek: Gameweek) -> Vec<EpRecord> {
        self.by_gameweek
            .get(&gameweek)
            .map(|gw| gw.values().cloned().collect())
            .unwrap_or_default()
    }

    fn sum_for_player(&self, player: PlayerId, start: Gameweek, end: Gameweek) -> f64 {
        if start > end {
            return 0.0;
        }
        self.by_gameweek
            .range(start..=end)
            .filter_map(|(_, gw)| gw.get(&player))
            .map(|r| r.ep)
            .sum()
    }

    fn horizon_totals(&self, start: Gameweek, end: Gameweek) -> HashMap<PlayerId, f64> {
        let mut totals = HashMap::new();
        if start > end {
            return totals;
        }
        for (_, gw) in self.by_gameweek.range(start..=end) {
            for rec in gw.values() {
                *totals.entry(rec.player).or_insert(0.0) += rec.ep;
            }
        }
        totals
    }

    fn record_count(&self) -> usize {
        self.by_gameweek.values().map(|gw| gw.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
