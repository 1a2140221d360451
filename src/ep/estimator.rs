//! Per-player, per-gameweek expected points.
//!
//! A deterministic heuristic built from expected minutes, appearance
//! points, a logistic clean-sheet probability, per-90 attacking rates and
//! a flat bonus. Missing team or fixture data degrades to defaults.

use serde::Deserialize;
use tracing::debug;

use crate::data::FactsRepository;
use crate::types::{Gameweek, PlayerFacts, Position};

// ---------------------------------------------------------------------------
// Configuration (defaults, overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// A value that depends on playing position.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PositionPoints {
    pub keeper: f64,
    pub defender: f64,
    pub midfielder: f64,
    pub forward: f64,
}

impl PositionPoints {
    pub fn for_position(&self, position: Position) -> f64 {
        match position {
            Position::Keeper => self.keeper,
            Position::Defender => self.defender,
            Position::Midfielder => self.midfielder,
            Position::Forward => self.forward,
        }
    }
}

/// Heuristic constants. The thresholds are uncalibrated and kept
/// configurable rather than baked in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Keepers are assumed to play full matches.
    pub keeper_minutes: f64,
    /// Expected minutes for flagged (non-available) outfield players.
    pub unavailable_minutes: f64,
    /// Recent minutes at or above this → `high_minutes`.
    pub high_minutes_threshold: u32,
    pub high_minutes: f64,
    /// Recent minutes at or above this → `mid_minutes`.
    pub mid_minutes_threshold: u32,
    pub mid_minutes: f64,
    pub low_minutes: f64,
    /// Expected minutes at or above this earn `start_points`.
    pub start_minutes: f64,
    pub start_points: f64,
    pub cameo_points: f64,
    /// EP for a gameweek in which the club has no fixture.
    pub blank_floor: f64,
    /// Divisor applied to the defence/attack difference before the sigmoid.
    pub logistic_scale: f64,
    /// Rating used when a club has no strength data at all.
    pub default_strength: f64,
    pub clean_sheet_points: PositionPoints,
    pub goal_points: PositionPoints,
    pub assist_points: f64,
    pub bonus: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            keeper_minutes: 90.0,
            unavailable_minutes: 20.0,
            high_minutes_threshold: 2000,
            high_minutes: 80.0,
            mid_minutes_threshold: 1000,
            mid_minutes: 65.0,
            low_minutes: 50.0,
            start_minutes: 60.0,
            start_points: 2.0,
            cameo_points: 1.0,
            blank_floor: 0.4,
            logistic_scale: 50.0,
            default_strength: 100.0,
            clean_sheet_points: PositionPoints {
                keeper: 4.0,
                defender: 4.0,
                midfielder: 1.0,
                forward: 0.0,
            },
            goal_points: PositionPoints {
                keeper: 6.0,
                defender: 6.0,
                midfielder: 5.0,
                forward: 4.0,
            },
            assist_points: 3.0,
            bonus: 0.2,
        }
    }
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Components of a single EP estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpBreakdown {
    pub expected_minutes: f64,
    pub appearance: f64,
    /// `None` for a blank gameweek.
    pub clean_sheet_prob: Option<f64>,
    pub clean_sheet: f64,
    pub attacking: f64,
    pub bonus: f64,
    pub total: f64,
}

impl EpBreakdown {
    fn blank(expected_minutes: f64, floor: f64) -> Self {
        Self {
            expected_minutes,
            appearance: 0.0,
            clean_sheet_prob: None,
            clean_sheet: 0.0,
            attacking: 0.0,
            bonus: 0.0,
            total: floor,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.clean_sheet_prob.is_none()
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Stateless EP estimator; holds only its constants.
#[derive(Debug, Clone, Default)]
pub struct EpEstimator {
    config: EstimatorConfig,
}

impl EpEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Expected points for `player` in `gameweek`. Always `>= 0`.
    pub fn estimate(&self, player: &PlayerFacts, gameweek: Gameweek, repo: &dyn FactsRepository) -> f64 {
        self.breakdown(player, gameweek, repo).total
    }

    /// Full component breakdown of an estimate.
    pub fn breakdown(
        &self,
        player: &PlayerFacts,
        gameweek: Gameweek,
        repo: &dyn FactsRepository,
    ) -> EpBreakdown {
        let cfg = &self.config;
        let xmins = self.expected_minutes(player);

        let Some(fixture) = repo.fixture_for(player.club, gameweek) else {
            debug!(player = player.id, club = player.club, gameweek, "Blank gameweek, using floor EP");
            return EpBreakdown::blank(xmins, cfg.blank_floor.max(0.0));
        };

        let appearance = if xmins >= cfg.start_minutes {
            cfg.start_points
        } else {
            cfg.cameo_points
        };

        // Own defence at our venue against their attack at theirs.
        let team_def = match repo.team(player.club) {
            Some(team) => team.defence(fixture.venue, cfg.default_strength),
            None => {
                debug!(club = player.club, gameweek, "No strength data for club, using default");
                cfg.default_strength
            }
        };
        let opp_att = match repo.team(fixture.opponent) {
            Some(opp) => opp.attack(fixture.venue.opposite(), cfg.default_strength),
            None => {
                debug!(club = fixture.opponent, gameweek, "No strength data for opponent, using default");
                cfg.default_strength
            }
        };

        let cs_prob = clean_sheet_probability(team_def, opp_att, cfg.logistic_scale);
        let clean_sheet = cs_prob * cfg.clean_sheet_points.for_position(player.position);

        let mins = player.minutes_recent.max(1) as f64;
        let goals_per90 = player.goals_recent as f64 / mins * 90.0;
        let assists_per90 = player.assists_recent as f64 / mins * 90.0;
        let attack_per90 =
            goals_per90 * cfg.goal_points.for_position(player.position) + assists_per90 * cfg.assist_points;
        let attacking = attack_per90 * (xmins / 90.0);

        let total = (appearance + clean_sheet + attacking + cfg.bonus).max(0.0);

        EpBreakdown {
            expected_minutes: xmins,
            appearance,
            clean_sheet_prob: Some(cs_prob),
            clean_sheet,
            attacking,
            bonus: cfg.bonus,
            total,
        }
    }

    /// Coarse starting-XI proxy from recent cumulative minutes.
    pub fn expected_minutes(&self, player: &PlayerFacts) -> f64 {
        let cfg = &self.config;
        if player.position == Position::Keeper {
            return cfg.keeper_minutes;
        }
        if !player.is_available() {
            return cfg.unavailable_minutes;
        }
        let m = player.minutes_recent;
        if m >= cfg.high_minutes_threshold {
            cfg.high_minutes
        } else if m >= cfg.mid_minutes_threshold {
            cfg.mid_minutes
        } else {
            cfg.low_minutes
        }
    }
}

/// Logistic transform of the scaled defence/attack difference, kept
/// strictly inside (0, 1).
pub fn clean_sheet_probability(team_defence: f64, opponent_attack: f64, scale: f64) -> f64 {
    let scale = if scale.abs() > f64::EPSILON { scale } else { 1.0 };
    let p = sigmoid((team_defence - opponent_attack) / scale);
    p.clamp(f64::EPSILON, 1.0 - f64::EPSILON)
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
