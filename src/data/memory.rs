//! In-memory facts repository.
//!
//! Holds a full snapshot of players, teams and fixtures and pre-indexes
//! fixtures by `(gameweek, club)` so lookups are O(1).

use std::collections::HashMap;

use tracing::debug;

use super::FactsRepository;
use crate::types::{ClubId, Fixture, FixtureRef, Gameweek, PlayerFacts, PlayerId, TeamStrength};

#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    players: Vec<PlayerFacts>,
    by_id: HashMap<PlayerId, usize>,
    teams: HashMap<ClubId, TeamStrength>,
    fixtures: HashMap<(Gameweek, ClubId), FixtureRef>,
}

impl InMemoryRepository {
    pub fn new(players: Vec<PlayerFacts>, teams: Vec<TeamStrength>, fixtures: Vec<Fixture>) -> Self {
        let mut repo = Self::default();
        for p in players {
            repo.insert_player(p);
        }
        for t in teams {
            repo.teams.insert(t.club, t);
        }
        repo.index_fixtures(fixtures);
        repo
    }

    /// Insert or replace a player.
    pub fn insert_player(&mut self, player: PlayerFacts) {
        match self.by_id.get(&player.id) {
            Some(&idx) => self.players[idx] = player,
            None => {
                self.by_id.insert(player.id, self.players.len());
                self.players.push(player);
            }
        }
    }

    pub fn insert_team(&mut self, team: TeamStrength) {
        self.teams.insert(team.club, team);
    }

    /// Only the lowest-id fixture per club and gameweek is kept; extra
    /// fixtures in a double gameweek are dropped.
    fn index_fixtures(&mut self, mut fixtures: Vec<Fixture>) {
        fixtures.sort_by_key(|f| f.id);
        for fx in &fixtures {
            let Some(gw) = fx.gameweek else { continue };
            for club in [fx.home, fx.away] {
                let Some(fref) = fx.for_club(club) else { continue };
                if self.fixtures.contains_key(&(gw, club)) {
                    debug!(club, gameweek = gw, fixture_id = fx.id, "Extra fixture in gameweek ignored");
                    continue;
                }
                self.fixtures.insert((gw, club), fref);
            }
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl FactsRepository for InMemoryRepository {
    fn players(&self) -> Vec<PlayerFacts> {
        self.players.clone()
    }

    fn player(&self, id: PlayerId) -> Option<PlayerFacts> {
        self.by_id.get(&id).map(|&idx| self.players[idx].clone())
    }

    fn team(&self, club: ClubId) -> Option<TeamStrength> {
        self.teams.get(&club).cloned()
    }

    fn fixture_for(&self, club: ClubId, gameweek: Gameweek) -> Option<FixtureRef> {
        self.fixtures.get(&(gameweek, club)).copied()
    }
}
