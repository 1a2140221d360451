//! Shared types for the SQUADSMITH engine.
//!
//! These types form the data model used across all modules. Player,
//! team and fixture facts are read-only snapshots owned by the data
//! repository; EP records and squad selections are derived values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable player identity (the provider's element id).
pub type PlayerId = u32;
/// Stable club identity.
pub type ClubId = u32;
/// A discrete round of fixtures.
pub type Gameweek = u32;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Playing position. Numeric codes 1..=4 follow the usual fantasy
/// element types (GK, DEF, MID, FWD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Keeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// All positions in squad order.
    pub const ALL: &'static [Position] = &[
        Position::Keeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Map a numeric element type onto a position.
    pub fn from_element_type(code: u8) -> Result<Self, SquadError> {
        match code {
            1 => Ok(Position::Keeper),
            2 => Ok(Position::Defender),
            3 => Ok(Position::Midfielder),
            4 => Ok(Position::Forward),
            other => Err(SquadError::MalformedIdentifier(format!(
                "unknown element type {other}"
            ))),
        }
    }

    pub fn element_type(&self) -> u8 {
        match self {
            Position::Keeper => 1,
            Position::Defender => 2,
            Position::Midfielder => 3,
            Position::Forward => 4,
        }
    }

    /// Short label used in tables.
    pub fn short(&self) -> &'static str {
        match self {
            Position::Keeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Keeper => write!(f, "Keeper"),
            Position::Defender => write!(f, "Defender"),
            Position::Midfielder => write!(f, "Midfielder"),
            Position::Forward => write!(f, "Forward"),
        }
    }
}

// ---------------------------------------------------------------------------
// Player facts
// ---------------------------------------------------------------------------

/// Status code meaning "available".
pub const STATUS_AVAILABLE: &str = "a";

/// Immutable snapshot of the facts the engine needs about one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerFacts {
    pub id: PlayerId,
    pub first_name: String,
    pub second_name: String,
    pub web_name: String,
    pub position: Position,
    /// Price in tenths (e.g. 55 = 5.5).
    pub cost_tenths: u32,
    pub club: ClubId,
    /// Free-text availability code; `None` is treated as available.
    pub status: Option<String>,
    pub minutes_recent: u32,
    pub goals_recent: u32,
    pub assists_recent: u32,
}

impl PlayerFacts {
    /// Cost as a one-decimal currency amount.
    pub fn cost(&self) -> Decimal {
        Decimal::new(self.cost_tenths as i64, 1)
    }

    pub fn is_available(&self) -> bool {
        self.status.as_deref().unwrap_or(STATUS_AVAILABLE) == STATUS_AVAILABLE
    }

    /// "First Second", falling back to the web name when both are blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.second_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.web_name.clone()
        } else {
            full.to_string()
        }
    }
}

impl fmt::Display for PlayerFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({} | club {} | £{:.1}m)",
            self.id,
            self.web_name,
            self.position.short(),
            self.club,
            self.cost(),
        )
    }
}

// ---------------------------------------------------------------------------
// Teams and fixtures
// ---------------------------------------------------------------------------

/// Per-club strength ratings. Any split may be absent; `strength` is the
/// single fallback rating.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamStrength {
    pub club: ClubId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub strength: Option<f64>,
    #[serde(default)]
    pub attack_home: Option<f64>,
    #[serde(default)]
    pub attack_away: Option<f64>,
    #[serde(default)]
    pub defence_home: Option<f64>,
    #[serde(default)]
    pub defence_away: Option<f64>,
}

impl TeamStrength {
    /// Defensive rating for the given venue, falling back to the single
    /// rating and then to `default`.
    pub fn defence(&self, venue: Venue, default: f64) -> f64 {
        let split = match venue {
            Venue::Home => self.defence_home,
            Venue::Away => self.defence_away,
        };
        split.or(self.strength).unwrap_or(default)
    }

    /// Attacking rating for the given venue, with the same fallbacks.
    pub fn attack(&self, venue: Venue, default: f64) -> f64 {
        let split = match venue {
            Venue::Home => self.attack_home,
            Venue::Away => self.attack_away,
        };
        split.or(self.strength).unwrap_or(default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    Home,
    Away,
}

impl Venue {
    pub fn opposite(&self) -> Self {
        match self {
            Venue::Home => Venue::Away,
            Venue::Away => Venue::Home,
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::Home => write!(f, "H"),
            Venue::Away => write!(f, "A"),
        }
    }
}

/// A scheduled (or unscheduled) match between two clubs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u32,
    /// `None` for fixtures not yet assigned to a gameweek.
    pub gameweek: Option<Gameweek>,
    pub home: ClubId,
    pub away: ClubId,
    #[serde(default)]
    pub finished: bool,
}

impl Fixture {
    /// The fixture as seen from `club`, if the club plays in it.
    pub fn for_club(&self, club: ClubId) -> Option<FixtureRef> {
        let gameweek = self.gameweek?;
        let (opponent, venue) = if self.home == club {
            (self.away, Venue::Home)
        } else if self.away == club {
            (self.home, Venue::Away)
        } else {
            return None;
        };
        Some(FixtureRef {
            fixture_id: self.id,
            gameweek,
            opponent,
            venue,
        })
    }
}

/// One club's view of a fixture: who they play and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRef {
    pub fixture_id: u32,
    pub gameweek: Gameweek,
    pub opponent: ClubId,
    pub venue: Venue,
}

// ---------------------------------------------------------------------------
// EP records
// ---------------------------------------------------------------------------

/// Expected points for one player in one gameweek. Derived data: always
/// safe to recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpRecord {
    pub player: PlayerId,
    pub gameweek: Gameweek,
    pub ep: f64,
    #[serde(default)]
    pub variance: Option<f64>,
}

/// A player ranked by EP for a single gameweek.
#[derive(Debug, Clone, Serialize)]
pub struct RankedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub web_name: String,
    pub club: ClubId,
    pub position: Position,
    pub cost: Decimal,
    pub ep: f64,
}

// ---------------------------------------------------------------------------
// Squad selection
// ---------------------------------------------------------------------------

/// One member of an optimized squad.
#[derive(Debug, Clone, Serialize)]
pub struct SelectedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub web_name: String,
    pub position: Position,
    pub club: ClubId,
    pub cost: Decimal,
    /// Horizon EP at full precision.
    pub ep: f64,
}

impl SelectedPlayer {
    pub fn ep_display(&self) -> f64 {
        round_to(self.ep, 2)
    }
}

/// Result of the squad optimizer. Totals are kept at full precision;
/// the `*_display` helpers round for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct SquadSelection {
    pub players: Vec<SelectedPlayer>,
    pub total_ep: f64,
    pub total_cost: Decimal,
}

impl SquadSelection {
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn count(&self, position: Position) -> usize {
        self.players.iter().filter(|p| p.position == position).count()
    }

    pub fn count_for_club(&self, club: ClubId) -> usize {
        self.players.iter().filter(|p| p.club == club).count()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    pub fn total_ep_display(&self) -> f64 {
        round_to(self.total_ep, 2)
    }

    pub fn total_cost_display(&self) -> Decimal {
        self.total_cost.round_dp(1)
    }
}

impl fmt::Display for SquadSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Squad: {} players | EP {:.2} | cost £{:.1}m",
            self.players.len(),
            self.total_ep_display(),
            self.total_cost_display(),
        )?;
        for p in &self.players {
            writeln!(
                f,
                "  {:<3} {:<20} club {:>2}  £{:>4.1}m  EP {:>6.2}",
                p.position.short(),
                p.web_name,
                p.club,
                p.cost,
                p.ep_display(),
            )?;
        }
        Ok(())
    }
}

/// A squad built for a gameweek horizon.
#[derive(Debug, Clone, Serialize)]
pub struct SquadPlan {
    pub gw_start: Gameweek,
    pub horizon: u32,
    pub budget: Decimal,
    pub selection: SquadSelection,
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Structural failures of the engine. Missing peripheral data is never an
/// error: it degrades to a default value and is logged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SquadError {
    #[error("No data to optimize: {0}")]
    NoData(String),

    #[error("Squad constraints are infeasible (solver status: {status})")]
    Infeasible { status: String },

    #[error("Solver failed (status: {status}): {message}")]
    Solver { status: String, message: String },

    #[error("Invalid squad rules: {0}")]
    InvalidRules(String),

    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
