//! Economy flows: build charges, leak penalties, kill rewards, and the
//! bonuses granted when waves and maps are cleared.

use glam::DVec2;
use riverguard_core::{
    Archetype, BuildError, ClearReward, EnemyScale, EnemySpec, LeakPenalty, LevelStats, MapConfig,
    MapSet, Phase, Progression, RouteConfig, Ruleset, SlotConfig, SpawnGroup, TowerSpec,
    WaveConfig,
};
use riverguard_world::{query, Game};

fn arrow_ruleset(damage: f64) -> Ruleset {
    Ruleset {
        towers: vec![TowerSpec {
            id: "arrow".to_owned(),
            name: "Arrow".to_owned(),
            archetype: Archetype::Physical,
            levels: vec![LevelStats {
                cost: 100,
                damage,
                range: 3.0,
                attack_speed: 1.0,
                ..LevelStats::default()
            }],
        }],
        enemies: vec![EnemySpec {
            id: "scout".to_owned(),
            hp: 100.0,
            speed: 1.0,
            coin_reward: 10,
            xp_reward: 2,
        }],
        progression: Progression {
            xp_per_wave_clear: 5,
            xp_map_clear: 20,
        },
    }
}

fn straight_map(waves: usize, scale: EnemyScale) -> MapConfig {
    MapConfig {
        id: "test_reach".to_owned(),
        name: "Test Reach".to_owned(),
        seed: 11,
        starting_coins: 1000,
        starting_xp: 10,
        leak_penalty: LeakPenalty { coins: 50, xp: 4 },
        enemy_scale: scale,
        xp_wave_bonus: 3,
        xp_map_bonus: 30,
        clear_reward: ClearReward { coins: 250, xp: 15 },
        routes: vec![RouteConfig {
            id: "main".to_owned(),
            waypoints: vec![DVec2::new(0.0, 0.5), DVec2::new(1.0, 0.5)],
        }],
        route_weights: vec![1.0],
        slot_activation_cost: 0,
        slot_clearance_px: None,
        build_slots: vec![SlotConfig {
            id: "s01".to_owned(),
            position: DVec2::new(0.05, 0.45),
            activation_cost: None,
        }],
        waves: (0..waves)
            .map(|_| WaveConfig {
                spawn_interval: 0.5,
                composition: vec![SpawnGroup {
                    enemy: "scout".to_owned(),
                    count: 1,
                }],
                route_weights: None,
            })
            .collect(),
    }
}

fn game_with(ruleset: Ruleset, map: MapConfig) -> Game {
    let maps = MapSet {
        default_map: map.id.clone(),
        maps: vec![map],
    };
    Game::new(ruleset, maps).expect("valid campaign")
}

#[test]
fn leaks_charge_coins_and_floor_experience_at_zero() {
    let mut game = game_with(arrow_ruleset(0.0), straight_map(2, EnemyScale::default()));
    let _ = game.start_next_wave().expect("wave 0");
    // One scout at speed 1.0 on a 10-unit route leaks on the tenth second.
    for _ in 0..12 {
        game.tick(1.0);
    }
    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.stats.leaked, 1);
    assert_eq!(snapshot.phase, Phase::WaveResult);
    // 1000 - 50 leak, then the wave-clear bonus lands on experience only.
    assert_eq!(snapshot.coins, 950);
    assert_eq!(snapshot.xp, 10 - 4 + 5 + 3);
}

#[test]
fn experience_deduction_never_goes_negative() {
    let mut map = straight_map(2, EnemyScale::default());
    map.starting_xp = 1;
    map.leak_penalty = LeakPenalty { coins: 1, xp: 99 };
    let mut game = game_with(arrow_ruleset(0.0), map);
    let _ = game.start_next_wave().expect("wave 0");
    for _ in 0..12 {
        game.tick(1.0);
    }
    // Floor at zero before the clear bonuses are added.
    assert_eq!(query::snapshot(&game).xp, 5 + 3);
}

#[test]
fn kill_rewards_land_one_tick_after_the_killing_blow() {
    let mut game = game_with(arrow_ruleset(1000.0), straight_map(2, EnemyScale::default()));
    let _ = game.activate_slot("s01").expect("activate");
    let _ = game.build_tower("s01", "arrow").expect("build");
    let coins_before = query::snapshot(&game).coins;
    let _ = game.start_next_wave().expect("wave 0");

    game.tick(0.1);
    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.stats.killed, 0, "corpse culled next effects pass");
    assert_eq!(snapshot.units_remaining, 1);

    game.tick(0.1);
    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.stats.killed, 1);
    assert_eq!(snapshot.coins, coins_before + 10);
    assert_eq!(snapshot.phase, Phase::WaveResult);
}

#[test]
fn reward_scaling_rounds_to_whole_coins() {
    let scale = EnemyScale {
        hp: 1.0,
        speed: 1.0,
        rewards: 1.25,
    };
    let mut game = game_with(arrow_ruleset(1000.0), straight_map(2, scale));
    let _ = game.activate_slot("s01").expect("activate");
    let _ = game.build_tower("s01", "arrow").expect("build");
    let coins_before = query::snapshot(&game).coins;
    let _ = game.start_next_wave().expect("wave 0");
    game.tick(0.1);
    game.tick(0.1);
    // 10 * 1.25 = 12.5 rounds to 13; 2 * 1.25 = 2.5 rounds to 3.
    assert_eq!(query::snapshot(&game).coins, coins_before + 13);
}

#[test]
fn final_wave_grants_clear_reward_and_map_bonuses() {
    let mut game = game_with(arrow_ruleset(1000.0), straight_map(1, EnemyScale::default()));
    let _ = game.activate_slot("s01").expect("activate");
    let _ = game.build_tower("s01", "arrow").expect("build");
    let before = query::snapshot(&game);
    let _ = game.start_next_wave().expect("only wave");
    game.tick(0.1);
    game.tick(0.1);

    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.phase, Phase::MapResult);
    let outcome = snapshot.outcome.expect("terminal outcome");
    assert!(outcome.victory);
    assert_eq!(outcome.map_id, "test_reach");
    assert_eq!(snapshot.coins, before.coins + 10 + 250);
    // Kill reward, wave clear, clear reward, and both map bonuses.
    assert_eq!(snapshot.xp, before.xp + 2 + (5 + 3) + 15 + 20 + 30);
}

#[test]
fn builds_are_allowed_mid_wave_but_not_after_the_map_ends() {
    let mut map = straight_map(1, EnemyScale::default());
    map.build_slots.push(SlotConfig {
        id: "s02".to_owned(),
        position: DVec2::new(0.8, 0.4),
        activation_cost: None,
    });
    let mut game = game_with(arrow_ruleset(1000.0), map);
    let _ = game.activate_slot("s01").expect("activate");
    let _ = game.build_tower("s01", "arrow").expect("build");
    let _ = game.start_next_wave().expect("only wave");
    game.tick(0.1);
    assert_eq!(query::snapshot(&game).phase, Phase::WaveRunning);
    let _ = game.activate_slot("s02").expect("mid-wave activation");
    let _ = game.build_tower("s02", "arrow").expect("mid-wave build");

    game.tick(0.1);
    assert_eq!(query::snapshot(&game).phase, Phase::MapResult);
    assert_eq!(game.upgrade_tower("s01"), Err(BuildError::InvalidPhase));
}

#[test]
fn reset_can_carry_the_economy_across_a_restart() {
    let mut game = game_with(arrow_ruleset(1000.0), straight_map(2, EnemyScale::default()));
    let _ = game.activate_slot("s01").expect("activate");
    let _ = game.build_tower("s01", "arrow").expect("build");
    let coins_spent = query::snapshot(&game).coins;

    game.reset(true);
    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.coins, coins_spent);
    assert_eq!(snapshot.phase, Phase::BuildPhase);
    assert!(query::tower_at(&game, "s01").is_none());

    game.reset(false);
    assert_eq!(query::snapshot(&game).coins, 1000);
}
