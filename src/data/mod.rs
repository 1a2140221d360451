//! Player, team and fixture facts.
//!
//! Defines the `FactsRepository` trait the engine reads from, an
//! in-memory implementation, and a JSON snapshot loader that builds one.

pub mod memory;
pub mod snapshot;

#[cfg(test)]
use mockall::automock;

use crate::types::{ClubId, FixtureRef, Gameweek, PlayerFacts, PlayerId, TeamStrength};

pub use memory::InMemoryRepository;

/// Read-only access to the facts the EP engine needs.
///
/// Any lookup may come back empty; callers degrade to default values
/// instead of failing.
#[cfg_attr(test, automock)]
pub trait FactsRepository {
    /// Every player in the pool.
    fn players(&self) -> Vec<PlayerFacts>;

    /// A single player by id.
    fn player(&self, id: PlayerId) -> Option<PlayerFacts>;

    /// Strength ratings for a club.
    fn team(&self, club: ClubId) -> Option<TeamStrength>;

    /// The club's fixture in a gameweek, or `None` for a blank gameweek.
    fn fixture_for(&self, club: ClubId, gameweek: Gameweek) -> Option<FixtureRef>;
}
