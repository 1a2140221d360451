//! JSON snapshot loader.
//!
//! Reads a `{ "teams": [...], "players": [...], "fixtures": [...] }`
//! document and converts it into an `InMemoryRepository`. Rows use
//! numeric element types and integer tenths for cost, so the loader is
//! where malformed identifiers are rejected.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use super::InMemoryRepository;
use crate::types::{ClubId, Fixture, Gameweek, PlayerFacts, PlayerId, Position, TeamStrength};

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    teams: Vec<TeamRow>,
    #[serde(default)]
    players: Vec<PlayerRow>,
    #[serde(default)]
    fixtures: Vec<FixtureRow>,
}

#[derive(Debug, Deserialize)]
struct TeamRow {
    id: ClubId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    short_name: String,
    #[serde(default)]
    strength: Option<f64>,
    #[serde(default)]
    strength_attack_home: Option<f64>,
    #[serde(default)]
    strength_attack_away: Option<f64>,
    #[serde(default)]
    strength_defence_home: Option<f64>,
    #[serde(default)]
    strength_defence_away: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PlayerRow {
    id: PlayerId,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    second_name: String,
    #[serde(default)]
    web_name: String,
    team: ClubId,
    element_type: u8,
    #[serde(default)]
    now_cost: u32,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    minutes: Option<u32>,
    #[serde(default)]
    goals_scored: Option<u32>,
    #[serde(default)]
    assists: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FixtureRow {
    id: u32,
    #[serde(default)]
    event: Option<Gameweek>,
    team_h: ClubId,
    team_a: ClubId,
    #[serde(default)]
    finished: Option<bool>,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

impl From<TeamRow> for TeamStrength {
    fn from(t: TeamRow) -> Self {
        TeamStrength {
            club: t.id,
            name: t.name,
            short_name: t.short_name,
            strength: t.strength,
            attack_home: t.strength_attack_home,
            attack_away: t.strength_attack_away,
            defence_home: t.strength_defence_home,
            defence_away: t.strength_defence_away,
        }
    }
}

impl TryFrom<PlayerRow> for PlayerFacts {
    type Error = crate::types::SquadError;

    fn try_from(p: PlayerRow) -> Result<Self, Self::Error> {
        let position = Position::from_element_type(p.element_type)?;
        let status = p.status.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Ok(PlayerFacts {
            id: p.id,
            first_name: p.first_name.trim().to_string(),
            second_name: p.second_name.trim().to_string(),
            web_name: p.web_name.trim().to_string(),
            position,
            cost_tenths: p.now_cost,
            club: p.team,
            status,
            minutes_recent: p.minutes.unwrap_or(0),
            goals_recent: p.goals_scored.unwrap_or(0),
            assists_recent: p.assists.unwrap_or(0),
        })
    }
}

impl From<FixtureRow> for Fixture {
    fn from(f: FixtureRow) -> Self {
        Fixture {
            id: f.id,
            gameweek: f.event,
            home: f.team_h,
            away: f.team_a,
            finished: f.finished.unwrap_or(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse a snapshot document.
pub fn from_json(json: &str) -> Result<InMemoryRepository> {
    let raw: SnapshotFile = serde_json::from_str(json).context("Failed to parse facts snapshot")?;

    let teams: Vec<TeamStrength> = raw.teams.into_iter().map(TeamStrength::from).collect();
    let players = raw
        .players
        .into_iter()
        .map(|row| {
            let id = row.id;
            PlayerFacts::try_from(row).with_context(|| format!("Invalid player row {id}"))
        })
        .collect::<Result<Vec<_>>>()?;
    let fixtures: Vec<Fixture> = raw.fixtures.into_iter().map(Fixture::from).collect();

    info!(
        teams = teams.len(),
        players = players.len(),
        fixtures = fixtures.len(),
        "Facts snapshot parsed"
    );

    Ok(InMemoryRepository::new(players, teams, fixtures))
}

/// Load a snapshot from disk.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<InMemoryRepository> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read facts snapshot: {}", path.display()))?;
    from_json(&json).with_context(|| format!("Failed to load facts snapshot: {}", path.display()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
