//! Constrained squad optimizer.
//!
//! Formulates squad selection as a 0/1 integer program: one binary per
//! player, exact squad size and positional quotas, a budget cap and a
//! per-club cap, maximizing summed horizon EP. Optionally a second stage
//! fixes the EP optimum and picks the cheapest squad reaching it.

pub mod microlp;
pub mod solver;

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::types::{ClubId, PlayerFacts, PlayerId, Position, SelectedPlayer, SquadError, SquadSelection};
use self::microlp::MicrolpBackend;
use self::solver::{Comparison, IntegerProgram, LinearExpr, Sense, SolveStatus, VarId};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Squad composition rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SquadRules {
    pub squad_size: usize,
    pub keepers: usize,
    pub defenders: usize,
    pub midfielders: usize,
    pub forwards: usize,
    pub max_per_club: usize,
}

impl Default for SquadRules {
    fn default() -> Self {
        Self {
            squad_size: 15,
            keepers: 2,
            defenders: 5,
            midfielders: 5,
            forwards: 3,
            max_per_club: 3,
        }
    }
}

impl SquadRules {
    pub fn quota(&self, position: Position) -> usize {
        match position {
            Position::Keeper => self.keepers,
            Position::Defender => self.defenders,
            Position::Midfielder => self.midfielders,
            Position::Forward => self.forwards,
        }
    }

    pub fn validate(&self) -> Result<(), SquadError> {
        if self.squad_size == 0 {
            return Err(SquadError::InvalidRules("squad size must be positive".into()));
        }
        let quotas: usize = Position::ALL.iter().map(|p| self.quota(*p)).sum();
        if quotas != self.squad_size {
            return Err(SquadError::InvalidRules(format!(
                "positional quotas sum to {quotas}, squad size is {}",
                self.squad_size
            )));
        }
        if self.max_per_club == 0 {
            return Err(SquadError::InvalidRules("max_per_club must be positive".into()));
        }
        Ok(())
    }
}

/// Optimizer settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Budget in the same unit as player cost (e.g. 100.0).
    pub budget: Decimal,
    /// Among squads with the optimal EP, return the cheapest.
    pub prefer_cheaper_on_ties: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            budget: dec!(100.0),
            prefer_cheaper_on_ties: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

/// Relative slack allowed on the EP optimum in the tie-break stage.
const TIE_TOLERANCE: f64 = 1e-6;

pub struct SquadOptimizer {
    rules: SquadRules,
    prefer_cheaper_on_ties: bool,
}

impl SquadOptimizer {
    pub fn new(rules: SquadRules, prefer_cheaper_on_ties: bool) -> Self {
        Self { rules, prefer_cheaper_on_ties }
    }

    pub fn rules(&self) -> &SquadRules {
        &self.rules
    }

    /// Select the squad maximizing summed horizon EP, using the microlp
    /// backend. Players missing from `horizon_ep` count as 0 EP.
    pub fn optimize(
        &self,
        players: &[PlayerFacts],
        horizon_ep: &HashMap<PlayerId, f64>,
        budget: Decimal,
    ) -> Result<SquadSelection, SquadError> {
        let mut program = MicrolpBackend::new();
        self.optimize_with(&mut program, players, horizon_ep, budget)
    }

    /// Same as `optimize`, on a caller-supplied (fresh) program.
    pub fn optimize_with(
        &self,
        program: &mut dyn IntegerProgram,
        players: &[PlayerFacts],
        horizon_ep: &HashMap<PlayerId, f64>,
        budget: Decimal,
    ) -> Result<SquadSelection, SquadError> {
        if players.is_empty() {
            return Err(SquadError::NoData("player pool is empty".into()));
        }
        if horizon_ep.is_empty() {
            return Err(SquadError::NoData("no EP records for the horizon; compute EP first".into()));
        }
        self.rules.validate()?;

        let pool = dedupe(players);
        let ep_of = |p: &PlayerFacts| -> f64 {
            match horizon_ep.get(&p.id) {
                Some(ep) if ep.is_finite() => *ep,
                Some(ep) => {
                    warn!(player = p.id, ep, "Non-finite EP treated as 0");
                    0.0
                }
                None => 0.0,
            }
        };

        // Costs in tenths keep the budget row integral.
        let budget_tenths = (budget * dec!(10))
            .to_f64()
            .ok_or_else(|| SquadError::InvalidRules(format!("budget {budget} out of range")))?;

        let vars: Vec<VarId> = pool.iter().map(|p| program.add_binary(&format!("x_{}", p.id))).collect();

        program.add_constraint(
            LinearExpr::sum_of(vars.iter().copied()),
            Comparison::Eq,
            self.rules.squad_size as f64,
        );

        for position in Position::ALL {
            let expr = LinearExpr::sum_of(
                pool.iter()
                    .zip(&vars)
                    .filter(|(p, _)| p.position == *position)
                    .map(|(_, v)| *v),
            );
            program.add_constraint(expr, Comparison::Eq, self.rules.quota(*position) as f64);
        }

        let cost_expr: LinearExpr = pool
            .iter()
            .zip(&vars)
            .map(|(p, v)| (*v, p.cost_tenths as f64))
            .collect();
        program.add_constraint(cost_expr.clone(), Comparison::Le, budget_tenths);

        let mut clubs: BTreeMap<ClubId, Vec<VarId>> = BTreeMap::new();
        for (p, v) in pool.iter().zip(&vars) {
            clubs.entry(p.club).or_default().push(*v);
        }
        for members in clubs.values() {
            program.add_constraint(
                LinearExpr::sum_of(members.iter().copied()),
                Comparison::Le,
                self.rules.max_per_club as f64,
            );
        }

        let ep_expr: LinearExpr = pool.iter().zip(&vars).map(|(p, v)| (*v, ep_of(*p))).collect();
        program.set_objective(ep_expr.clone(), Sense::Maximize);

        info!(
            players = pool.len(),
            clubs = clubs.len(),
            budget = %budget,
            "Solving squad selection"
        );

        expect_optimal(program.solve())?;
        let mut chosen = selected(&*program, &vars)?;

        if self.prefer_cheaper_on_ties {
            let best: f64 = chosen.iter().map(|&i| ep_of(pool[i])).sum();
            let slack = TIE_TOLERANCE * best.abs().max(1.0);
            program.add_constraint(ep_expr, Comparison::Ge, best - slack);
            program.set_objective(cost_expr, Sense::Minimize);
            debug!(best_ep = best, "Tie-break stage: cheapest squad at optimal EP");
            expect_optimal(program.solve())?;
            chosen = selected(&*program, &vars)?;
        }

        if chosen.len() != self.rules.squad_size {
            return Err(SquadError::Solver {
                status: SolveStatus::Optimal.to_string(),
                message: format!(
                    "solution has {} players, expected {}",
                    chosen.len(),
                    self.rules.squad_size
                ),
            });
        }

        let mut squad: Vec<SelectedPlayer> = chosen
            .iter()
            .map(|&i| {
                let p = pool[i];
                SelectedPlayer {
                    id: p.id,
                    name: p.display_name(),
                    web_name: p.web_name.clone(),
                    position: p.position,
                    club: p.club,
                    cost: p.cost(),
                    ep: ep_of(p),
                }
            })
            .collect();
        squad.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then(b.ep.partial_cmp(&a.ep).unwrap_or(std::cmp::Ordering::Equal))
                .then(a.id.cmp(&b.id))
        });

        let total_ep: f64 = squad.iter().map(|p| p.ep).sum();
        let total_cost: Decimal = squad.iter().map(|p| p.cost).sum();

        info!(
            total_ep = format!("{total_ep:.2}"),
            total_cost = %total_cost,
            "Squad selected"
        );

        Ok(SquadSelection { players: squad, total_ep, total_cost })
    }
}

/// First occurrence of each player id wins.
fn dedupe(players: &[PlayerFacts]) -> Vec<&PlayerFacts> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(players.len());
    for p in players {
        if seen.insert(p.id) {
            out.push(p);
        } else {
            warn!(player = p.id, "Duplicate player in pool ignored");
        }
    }
    out
}

fn expect_optimal(status: SolveStatus) -> Result<(), SquadError> {
    match status {
        SolveStatus::Optimal => Ok(()),
        SolveStatus::Infeasible => Err(SquadError::Infeasible { status: status.to_string() }),
        other => Err(SquadError::Solver {
            status: other.to_string(),
            message: "solver did not report an optimal solution".into(),
        }),
    }
}

/// Indices (into the pool) of variables set to 1.
fn selected(program: &dyn IntegerProgram, vars: &[VarId]) -> Result<Vec<usize>, SquadError> {
    let mut chosen = Vec::new();
    for (i, v) in vars.iter().enumerate() {
        let value = program.value(*v).ok_or_else(|| SquadError::Solver {
            status: SolveStatus::Optimal.to_string(),
            message: format!("no solution value for variable {}", v.0),
        })?;
        if value > 0.5 {
            chosen.push(i);
        }
    }
    Ok(chosen)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
