//! End-to-end: facts → EP recompute → store → squad.

use rust_decimal_macros::dec;
use std::path::PathBuf;

use squadsmith::config::AppConfig;
use squadsmith::data::snapshot::load_snapshot;
use squadsmith::data::FactsRepository;
use squadsmith::engine::Planner;
use squadsmith::ep::{EpAggregator, EpEstimator, EstimatorConfig};
use squadsmith::optimizer::{SquadOptimizer, SquadRules};
use squadsmith::storage::json::JsonEpStore;
use squadsmith::storage::{EpStore, MemoryEpStore};
use squadsmith::types::{Position, SquadError};

use crate::mock_store::FlakyEpStore;
use crate::synthetic_league::{random_league, rng};

fn planner() -> Planner {
    Planner::new(
        EpAggregator::new(EpEstimator::new(EstimatorConfig::default())),
        SquadOptimizer::new(SquadRules::default(), true),
    )
}

fn manifest_path(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(rel)
}

fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!("squadsmith_it_ep_{}.json", uuid::Uuid::new_v4()))
}

#[test]
fn test_recompute_is_idempotent() {
    let league = random_league(&mut rng(21), 8, 14, 4);
    let repo = league.repository();
    let planner = planner();

    let mut store = MemoryEpStore::new();
    let first = planner.recompute(&repo, &mut store, 1, 4).unwrap();
    let snapshot: Vec<_> = (1..=4).map(|gw| store.records_for(gw)).collect();

    let second = planner.recompute(&repo, &mut store, 1, 4).unwrap();
    assert_eq!(first, second);
    assert_eq!(store.record_count(), league.players.len() * 4);
    for gw in 1..=4 {
        assert_eq!(store.records_for(gw), snapshot[gw as usize - 1]);
    }
}

#[test]
fn test_blank_gameweek_gets_floor() {
    // Fixtures exist for gameweeks 1-2 only.
    let league = random_league(&mut rng(4), 6, 13, 2);
    let repo = league.repository();
    let mut store = MemoryEpStore::new();
    planner().recompute(&repo, &mut store, 1, 3).unwrap();

    let gw3 = store.records_for(3);
    assert_eq!(gw3.len(), league.players.len());
    assert!(gw3.iter().all(|r| r.ep == 0.4));
    assert!(store.records_for(1).iter().any(|r| r.ep > 0.4));
}

#[test]
fn test_every_ep_is_non_negative_and_finite() {
    let league = random_league(&mut rng(13), 10, 15, 3);
    let repo = league.repository();
    let mut store = MemoryEpStore::new();
    planner().recompute(&repo, &mut store, 1, 3).unwrap();
    for gw in 1..=3 {
        for r in store.records_for(gw) {
            assert!(r.ep.is_finite() && r.ep >= 0.0, "player {} gw {gw}: {}", r.player, r.ep);
        }
    }
}

#[test]
fn test_selected_ep_matches_horizon_sum() {
    let league = random_league(&mut rng(11), 8, 14, 5);
    let repo = league.repository();
    let planner = planner();
    let mut store = MemoryEpStore::new();
    planner.recompute(&repo, &mut store, 1, 5).unwrap();

    let plan = planner.build_squad(&repo, &store, 2, 3, dec!(100.0)).unwrap();
    assert_eq!(plan.selection.len(), 15);
    for p in &plan.selection.players {
        let expected = store.sum_for_player(p.id, 2, 4);
        assert!((p.ep - expected).abs() < 1e-9);
    }
}

#[test]
fn test_store_failure_stops_recompute() {
    let league = random_league(&mut rng(2), 6, 13, 5);
    let repo = league.repository();
    let mut store = FlakyEpStore::failing_on(3);

    let err = planner().recompute(&repo, &mut store, 1, 5).unwrap_err();
    assert!(matches!(err, SquadError::Storage(_)));
    assert_eq!(store.writes(), 2);
    assert!(store.records_for(3).is_empty());
    assert!(store.records_for(4).is_empty());
}

#[test]
fn test_failing_store_leaves_nothing_to_optimize() {
    let league = random_league(&mut rng(2), 6, 13, 1);
    let repo = league.repository();
    let mut store = FlakyEpStore::always_failing();
    let planner = planner();

    assert!(planner.recompute(&repo, &mut store, 1, 1).is_err());
    let err = planner.build_squad(&repo, &store, 1, 1, dec!(100.0)).unwrap_err();
    assert!(matches!(err, SquadError::NoData(_)));
}

#[test]
fn test_sample_snapshot_through_json_store() {
    let repo = load_snapshot(manifest_path("data/sample_snapshot.json")).unwrap();
    let cfg = AppConfig::load(manifest_path("config.toml").to_str().unwrap()).unwrap();
    let planner = Planner::from_config(&cfg);
    let path = temp_path();

    let first = {
        let mut store = JsonEpStore::open(&path).unwrap();
        planner.recompute(&repo, &mut store, 1, 6).unwrap();
        planner.build_squad(&repo, &store, 1, 6, dec!(100.0)).unwrap()
    };
    assert_eq!(first.selection.len(), 15);
    assert!(first.selection.total_cost <= dec!(100.0));

    // Reopened store yields the same squad without recomputing.
    let store = JsonEpStore::open(&path).unwrap();
    assert_eq!(store.record_count(), repo.players().len() * 6);
    let second = planner.build_squad(&repo, &store, 1, 6, dec!(100.0)).unwrap();
    let ids = |s: &squadsmith::types::SquadSelection| s.players.iter().map(|p| p.id).collect::<Vec<_>>();
    assert_eq!(ids(&first.selection), ids(&second.selection));

    let keepers = planner.top_ep(&repo, &store, 1, Some(Position::Keeper), 3);
    assert_eq!(keepers.len(), 3);
    assert!(keepers.windows(2).all(|w| w[0].ep >= w[1].ep));

    JsonEpStore::delete(&path).unwrap();
}
