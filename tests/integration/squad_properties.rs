//! Squad optimizer properties over seeded random pools.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};

use squadsmith::optimizer::{SquadOptimizer, SquadRules};
use squadsmith::types::{ClubId, PlayerFacts, PlayerId, Position, SquadError, SquadSelection};

use crate::synthetic_league::{make_player, random_league, rng};

fn optimizer() -> SquadOptimizer {
    SquadOptimizer::new(SquadRules::default(), true)
}

fn assert_legal(squad: &SquadSelection, rules: &SquadRules, budget: Decimal) {
    assert_eq!(squad.len(), rules.squad_size);
    for &position in Position::ALL {
        assert_eq!(squad.count(position), rules.quota(position), "quota for {position}");
    }
    assert!(squad.total_cost <= budget, "cost {} over budget {budget}", squad.total_cost);

    let clubs: HashSet<ClubId> = squad.players.iter().map(|p| p.club).collect();
    for club in clubs {
        assert!(squad.count_for_club(club) <= rules.max_per_club, "club {club} over cap");
    }

    let ids: HashSet<PlayerId> = squad.players.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), squad.len(), "duplicate player in squad");

    let cost: Decimal = squad.players.iter().map(|p| p.cost).sum();
    assert_eq!(cost, squad.total_cost);
    let ep: f64 = squad.players.iter().map(|p| p.ep).sum();
    assert!((ep - squad.total_ep).abs() < 1e-6);
}

/// Greedy-by-EP squad, if it happens to complete within budget.
fn greedy_ep(players: &[PlayerFacts], ep: &HashMap<PlayerId, f64>, rules: &SquadRules, budget: Decimal) -> Option<f64> {
    let mut sorted: Vec<&PlayerFacts> = players.iter().collect();
    sorted.sort_by(|a, b| ep[&b.id].total_cmp(&ep[&a.id]));

    let mut per_position: HashMap<Position, usize> = HashMap::new();
    let mut per_club: HashMap<ClubId, usize> = HashMap::new();
    let mut cost = Decimal::ZERO;
    let mut total = 0.0;
    let mut picked = 0;
    for p in sorted {
        let pos_count = per_position.entry(p.position).or_default();
        let club_count = per_club.entry(p.club).or_default();
        if *pos_count >= rules.quota(p.position) || *club_count >= rules.max_per_club {
            continue;
        }
        *pos_count += 1;
        *club_count += 1;
        cost += p.cost();
        total += ep[&p.id];
        picked += 1;
    }
    (picked == rules.squad_size && cost <= budget).then_some(total)
}

#[test]
fn test_random_pools_respect_every_rule() {
    let rules = SquadRules::default();
    for seed in 0..8u64 {
        let mut rng = rng(seed);
        let clubs = 6 + 2 * (seed as u32 % 4);
        let per_position = clubs.max(13) + (seed as u32 % 5);
        let league = random_league(&mut rng, clubs, per_position, 1);
        let ep = league.random_ep(&mut rng);
        assert!(league.players.len() >= 50);

        let squad = optimizer().optimize(&league.players, &ep, dec!(100.0)).unwrap();
        assert_legal(&squad, &rules, dec!(100.0));

        if let Some(greedy) = greedy_ep(&league.players, &ep, &rules, dec!(100.0)) {
            assert!(squad.total_ep >= greedy - 1e-6, "seed {seed}: optimum below greedy squad");
        }
    }
}

#[test]
fn test_tighter_budget_never_beats_looser_one() {
    let mut rng = rng(42);
    let league = random_league(&mut rng, 8, 14, 1);
    let ep = league.random_ep(&mut rng);

    let loose = optimizer().optimize(&league.players, &ep, dec!(100.0)).unwrap();
    let tight = optimizer().optimize(&league.players, &ep, dec!(70.0)).unwrap();
    assert_legal(&tight, &SquadRules::default(), dec!(70.0));
    assert!(tight.total_ep <= loose.total_ep + 1e-6);
}

#[test]
fn test_uniform_ep_picks_cheapest_squad() {
    // 3 GK, 7 DEF, 6 MID, 4 FWD; cost rises by 0.5m within each position.
    let mut players = Vec::new();
    let mut id = 1;
    for (position, n) in [
        (Position::Keeper, 3),
        (Position::Defender, 7),
        (Position::Midfielder, 6),
        (Position::Forward, 4),
    ] {
        for k in 0..n {
            players.push(make_player(id, position, (id % 8) + 1, 40 + 5 * k));
            id += 1;
        }
    }
    let ep: HashMap<PlayerId, f64> = players.iter().map(|p| (p.id, 5.0)).collect();

    let squad = optimizer().optimize(&players, &ep, dec!(100.0)).unwrap();
    assert_legal(&squad, &SquadRules::default(), dec!(100.0));
    assert_eq!(squad.total_cost, dec!(72.0));
    for dropped in [3, 9, 10, 16, 20] {
        assert!(!squad.contains(dropped), "player {dropped} is the priciest in position");
    }
    assert!((squad.total_ep - 75.0).abs() < 1e-9);
}

#[test]
fn test_star_player_always_selected() {
    let mut rng = rng(7);
    let mut league = random_league(&mut rng, 8, 14, 1);
    let mut ep = league.random_ep(&mut rng);

    let star = league.players[30].id;
    league.players[30].cost_tenths = 130;
    ep.insert(star, 100.0);

    let squad = optimizer().optimize(&league.players, &ep, dec!(100.0)).unwrap();
    assert!(squad.contains(star));
    assert_legal(&squad, &SquadRules::default(), dec!(100.0));
}

#[test]
fn test_empty_pool_is_no_data() {
    let ep = HashMap::from([(1, 3.0)]);
    let err = optimizer().optimize(&[], &ep, dec!(100.0)).unwrap_err();
    assert!(matches!(err, SquadError::NoData(_)));
}

#[test]
fn test_budget_below_cheapest_squad_is_infeasible() {
    let mut rng = rng(5);
    let league = random_league(&mut rng, 6, 13, 1);
    let ep = league.random_ep(&mut rng);

    // Cheapest legal squad is 15 x 4.0m.
    let err = optimizer().optimize(&league.players, &ep, dec!(59.9)).unwrap_err();
    assert!(matches!(err, SquadError::Infeasible { .. }));

    let squad = optimizer().optimize(&league.players, &ep, dec!(60.0)).unwrap();
    assert_eq!(squad.total_cost, dec!(60.0));
}

#[test]
fn test_custom_rules() {
    let rules = SquadRules {
        squad_size: 11,
        keepers: 1,
        defenders: 4,
        midfielders: 4,
        forwards: 2,
        max_per_club: 2,
    };
    let mut rng = rng(9);
    let league = random_league(&mut rng, 8, 14, 1);
    let ep = league.random_ep(&mut rng);

    let squad = SquadOptimizer::new(rules.clone(), false)
        .optimize(&league.players, &ep, dec!(80.0))
        .unwrap();
    assert_legal(&squad, &rules, dec!(80.0));
}

/// All `k`-subsets of `items`.
fn subsets<T: Copy>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    if items.len() < k {
        return Vec::new();
    }
    let mut out: Vec<Vec<T>> = subsets(&items[1..], k - 1)
        .into_iter()
        .map(|mut rest| {
            rest.insert(0, items[0]);
            rest
        })
        .collect();
    out.extend(subsets(&items[1..], k));
    out
}

/// Exhaustive best (EP, cost in tenths) under the default rules, or
/// `None` when no legal squad exists. Ties on EP go to the cheapest.
fn exhaustive_best(players: &[PlayerFacts], ep: &HashMap<PlayerId, f64>, budget_tenths: u32) -> Option<(f64, u32)> {
    let rules = SquadRules::default();
    let by_position: Vec<Vec<Vec<&PlayerFacts>>> = Position::ALL
        .iter()
        .map(|&position| {
            let pool: Vec<&PlayerFacts> = players.iter().filter(|p| p.position == position).collect();
            subsets(&pool, rules.quota(position))
        })
        .collect();

    let mut squads: Vec<(f64, u32)> = Vec::new();
    for gk in &by_position[0] {
        for def in &by_position[1] {
            for mid in &by_position[2] {
                for fwd in &by_position[3] {
                    let squad: Vec<&PlayerFacts> = gk.iter().chain(def).chain(mid).chain(fwd).copied().collect();
                    let cost: u32 = squad.iter().map(|p| p.cost_tenths).sum();
                    if cost > budget_tenths {
                        continue;
                    }
                    let mut per_club: HashMap<ClubId, usize> = HashMap::new();
                    for p in &squad {
                        *per_club.entry(p.club).or_default() += 1;
                    }
                    if per_club.values().any(|&n| n > rules.max_per_club) {
                        continue;
                    }
                    squads.push((squad.iter().map(|p| ep[&p.id]).sum(), cost));
                }
            }
        }
    }

    let best = squads.iter().map(|(e, _)| *e).fold(f64::NEG_INFINITY, f64::max);
    let slack = 1e-6 * best.abs().max(1.0);
    squads
        .iter()
        .filter(|(e, _)| *e >= best - slack)
        .map(|(_, c)| *c)
        .min()
        .map(|cost| (best, cost))
}

#[test]
fn test_matches_exhaustive_search_on_small_pools() {
    use rand::Rng;

    for seed in 0..12u64 {
        let mut rng = rng(1000 + seed);
        // 3 GK, 6 DEF, 6 MID, 4 FWD over 5 clubs so the cap can bind.
        let mut players = Vec::new();
        let mut id = 1;
        for (position, n) in [
            (Position::Keeper, 3),
            (Position::Defender, 6),
            (Position::Midfielder, 6),
            (Position::Forward, 4),
        ] {
            for _ in 0..n {
                let club = rng.gen_range(1..=5);
                let cost = 40 + 5 * rng.gen_range(0..=12);
                players.push(make_player(id, position, club, cost));
                id += 1;
            }
        }
        // Small integer EPs so ties on EP are common.
        let ep: HashMap<PlayerId, f64> = players.iter().map(|p| (p.id, rng.gen_range(0..=4) as f64)).collect();
        let budget_tenths = 750 + 10 * rng.gen_range(0..=25u32);
        let budget = Decimal::new(budget_tenths as i64, 1);

        let expected = exhaustive_best(&players, &ep, budget_tenths);
        match (expected, optimizer().optimize(&players, &ep, budget)) {
            (Some((best_ep, best_cost)), Ok(squad)) => {
                assert_legal(&squad, &SquadRules::default(), budget);
                assert!((squad.total_ep - best_ep).abs() < 1e-6, "seed {seed}: EP {} vs {best_ep}", squad.total_ep);
                assert_eq!(squad.total_cost, Decimal::new(best_cost as i64, 1), "seed {seed}: cost");
            }
            (None, Err(SquadError::Infeasible { .. })) => {}
            (expected, got) => panic!("seed {seed}: exhaustive {expected:?}, optimizer {got:?}"),
        }
    }
}
