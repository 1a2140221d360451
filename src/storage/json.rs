//! File-backed EP store.
//!
//! Keeps all records in memory and mirrors them to a pretty-printed JSON
//! file. Every gameweek replace rewrites the file through a temp file and
//! a rename, so a crash leaves either the old or the new snapshot.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{build_gameweek, EpStore, MemoryEpStore};
use crate::types::{EpRecord, Gameweek, PlayerId, SquadError};

/// Default EP snapshot path.
pub const DEFAULT_EP_FILE: &str = "squadsmith_ep.json";

#[derive(Debug, Serialize, Deserialize)]
struct EpFile {
    computed_at: DateTime<Utc>,
    records: Vec<EpRecord>,
}

#[derive(Debug)]
pub struct JsonEpStore {
    path: PathBuf,
    inner: MemoryEpStore,
    computed_at: Option<DateTime<Utc>>,
}

impl JsonEpStore {
    /// Open the store at `path`, loading existing records if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            info!(path = %path.display(), "No EP snapshot found, starting empty");
            return Ok(Self { path, inner: MemoryEpStore::new(), computed_at: None });
        }

        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read EP snapshot from {}", path.display()))?;
        let file: EpFile = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse EP snapshot from {}", path.display()))?;

        info!(
            path = %path.display(),
            records = file.records.len(),
            computed_at = %file.computed_at,
            "EP snapshot loaded from disk"
        );

        Ok(Self {
            path,
            inner: MemoryEpStore::from_records(file.records),
            computed_at: Some(file.computed_at),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the snapshot was last written.
    pub fn computed_at(&self) -> Option<DateTime<Utc>> {
        self.computed_at
    }

    /// Delete the snapshot file (for testing or reset).
    pub fn delete(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to delete EP snapshot {}", path.display()))?;
        }
        Ok(())
    }

    fn write_snapshot(&self, store: &MemoryEpStore, computed_at: DateTime<Utc>) -> Result<()> {
        let file = EpFile { computed_at, records: store.all_records() };
        let json = serde_json::to_string_pretty(&file).context("Failed to serialise EP records")?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(format!(".{}.tmp", uuid::Uuid::new_v4()));
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, &json)
            .with_context(|| format!("Failed to write EP snapshot to {}", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("Failed to move EP snapshot into {}", self.path.display()));
        }

        debug!(path = %self.path.display(), records = file.records.len(), "EP snapshot saved");
        Ok(())
    }
}

impl EpStore for JsonEpStore {
    fn replace_gameweek(&mut self, gameweek: Gameweek, records: Vec<EpRecord>) -> Result<usize, SquadError> {
        // Validate before touching anything.
        let fresh = build_gameweek(gameweek, records)?;
        let mut next = self.inner.clone();
        let count = next.replace_gameweek(gameweek, fresh.into_values().collect())?;

        let now = Utc::now();
        self.write_snapshot(&next, now)
            .map_err(|e| SquadError::Storage(format!("{e:#}")))?;

        self.inner = next;
        self.computed_at = Some(now);
        Ok(count)
    }

    fn records_for(&self, gameweek: Gameweek) -> Vec<EpRecord> {
        self.inner.records_for(gameweek)
    }

    fn sum_for_player(&self, player: PlayerId, start: Gameweek, end: Gameweek) -> f64 {
        self.inner.sum_for_player(player, start, end)
    }

    fn horizon_totals(&self, start: Gameweek, end: Gameweek) -> HashMap<PlayerId, f64> {
        self.inner.horizon_totals(start, end)
    }

    fn record_count(&self) -> usize {
        self.inner.record_count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
