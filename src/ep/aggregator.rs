//! EP aggregation.
//!
//! Recomputes EP records for a gameweek range (delete-then-rewrite per
//! gameweek) and ranks players by EP. Concurrent recomputes over
//! overlapping ranges must be serialized by the caller; taking the store
//! by `&mut` enforces that within one process.

use std::cmp::Ordering;

use tracing::{debug, info, warn};

use super::estimator::EpEstimator;
use crate::data::FactsRepository;
use crate::storage::EpStore;
use crate::types::{round_to, EpRecord, Gameweek, PlayerId, Position, RankedPlayer, SquadError};

pub struct EpAggregator {
    estimator: EpEstimator,
}

impl EpAggregator {
    pub fn new(estimator: EpEstimator) -> Self {
        Self { estimator }
    }

    pub fn estimator(&self) -> &EpEstimator {
        &self.estimator
    }

    /// Recompute records for every gameweek in `[gw_start, gw_end]`.
    ///
    /// Each gameweek is built in full before it replaces the stored one,
    /// so rerunning with the same inputs yields the same record set.
    /// Returns the number of records written.
    pub fn recompute(
        &self,
        repo: &dyn FactsRepository,
        store: &mut dyn EpStore,
        gw_start: Gameweek,
        gw_end: Gameweek,
    ) -> Result<usize, SquadError> {
        if gw_start > gw_end {
            warn!(gw_start, gw_end, "Empty gameweek range, nothing to recompute");
            return Ok(0);
        }

        let players = repo.players();
        let mut total = 0;

        for gw in gw_start..=gw_end {
            let records: Vec<EpRecord> = players
                .iter()
                .map(|p| EpRecord {
                    player: p.id,
                    gameweek: gw,
                    ep: self.estimator.estimate(p, gw, repo),
                    variance: None,
                })
                .collect();

            let written = store.replace_gameweek(gw, records)?;
            debug!(gameweek = gw, records = written, "Gameweek EP replaced");
            total += written;
        }

        info!(
            gw_start,
            gw_end,
            players = players.len(),
            records = total,
            "EP recompute complete"
        );

        Ok(total)
    }

    /// Players ranked by EP for one gameweek, optionally filtered by
    /// position. Ties are broken by player id; records whose player has
    /// left the pool are skipped.
    pub fn top(
        &self,
        repo: &dyn FactsRepository,
        store: &dyn EpStore,
        gameweek: Gameweek,
        position: Option<Position>,
        limit: usize,
    ) -> Vec<RankedPlayer> {
        let mut rows: Vec<RankedPlayer> = store
            .records_for(gameweek)
            .into_iter()
            .filter_map(|rec| {
                let Some(p) = repo.player(rec.player) else {
                    debug!(player = rec.player, gameweek, "EP record without player, skipped");
                    return None;
                };
                if position.is_some_and(|pos| pos != p.position) {
                    return None;
                }
                Some(RankedPlayer {
                    id: p.id,
                    name: p.display_name(),
                    web_name: p.web_name.clone(),
                    club: p.club,
                    position: p.position,
                    cost: p.cost(),
                    ep: round_to(rec.ep, 2),
                })
            })
            .collect();

        rows.sort_by(|a, b| by_ep_desc(a.ep, a.id, b.ep, b.id));
        rows.truncate(limit);
        rows
    }
}

fn by_ep_desc(ep_a: f64, id_a: PlayerId, ep_b: f64, id_b: PlayerId) -> Ordering {
    ep_b.partial_cmp(&ep_a)
        .unwrap_or(Ordering::Equal)
        .then(id_a.cmp(&id_b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
