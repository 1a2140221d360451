//! Planner. Ties EP recompute, horizon sums and squad optimization
//! together for callers that only hold a repository and a store.

use rust_decimal::Decimal;
use tracing::info;

use crate::config::AppConfig;
use crate::data::FactsRepository;
use crate::ep::{EpAggregator, EpEstimator};
use crate::optimizer::SquadOptimizer;
use crate::storage::EpStore;
use crate::types::{Gameweek, Position, RankedPlayer, SquadError, SquadPlan};

pub struct Planner {
    aggregator: EpAggregator,
    optimizer: SquadOptimizer,
}

impl Planner {
    pub fn new(aggregator: EpAggregator, optimizer: SquadOptimizer) -> Self {
        Self { aggregator, optimizer }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(
            EpAggregator::new(EpEstimator::new(cfg.estimator.clone())),
            SquadOptimizer::new(cfg.squad.clone(), cfg.optimizer.prefer_cheaper_on_ties),
        )
    }

    pub fn aggregator(&self) -> &EpAggregator {
        &self.aggregator
    }

    pub fn optimizer(&self) -> &SquadOptimizer {
        &self.optimizer
    }

    /// Recompute EP records for `[gw_start, gw_end]`.
    pub fn recompute(
        &self,
        repo: &dyn FactsRepository,
        store: &mut dyn EpStore,
        gw_start: Gameweek,
        gw_end: Gameweek,
    ) -> Result<usize, SquadError> {
        self.aggregator.recompute(repo, store, gw_start, gw_end)
    }

    /// Best squad over `horizon` gameweeks starting at `gw_start`, using
    /// the EP records already in `store`.
    pub fn build_squad(
        &self,
        repo: &dyn FactsRepository,
        store: &dyn EpStore,
        gw_start: Gameweek,
        horizon: u32,
        budget: Decimal,
    ) -> Result<SquadPlan, SquadError> {
        if horizon == 0 {
            return Err(SquadError::InvalidRules("horizon must cover at least one gameweek".into()));
        }
        let gw_end = gw_start.saturating_add(horizon - 1);

        let horizon_ep = store.horizon_totals(gw_start, gw_end);
        let players = repo.players();
        info!(
            gw_start,
            gw_end,
            players = players.len(),
            with_ep = horizon_ep.len(),
            "Building squad"
        );

        let selection = self.optimizer.optimize(&players, &horizon_ep, budget)?;
        Ok(SquadPlan { gw_start, horizon, budget, selection })
    }

    /// Top players by EP for one gameweek.
    pub fn top_ep(
        &self,
        repo: &dyn FactsRepository,
        store: &dyn EpStore,
        gameweek: Gameweek,
        position: Option<Position>,
        limit: usize,
    ) -> Vec<RankedPlayer> {
        self.aggregator.top(repo, store, gameweek, position, limit)
    }

    /// Top `limit` players for every position, keepers first.
    pub fn top_ep_by_position(
        &self,
        repo: &dyn FactsRepository,
        store: &dyn EpStore,
        gameweek: Gameweek,
        limit: usize,
    ) -> Vec<(Position, Vec<RankedPlayer>)> {
        Position::ALL
            .iter()
            .map(|&position| (position, self.top_ep(repo, store, gameweek, Some(position), limit)))
            .collect()
    }
}
