//! Wave lifecycle: phase transitions, spawn accounting, determinism, defeat,
//! and the offload delegation path with its local fallback.

use glam::DVec2;
use riverguard_core::{
    Archetype, EnemySpec, LeakPenalty, LevelStats, MapConfig, MapSet, OffloadError, Phase,
    Progression, RouteConfig, Ruleset, SlotConfig, SpawnGroup, TowerSpec, WaveConfig, WaveError,
    WaveOffload, WavePayload, WaveReport,
};
use riverguard_world::{query, Game};

fn ruleset() -> Ruleset {
    Ruleset {
        towers: vec![TowerSpec {
            id: "arrow".to_owned(),
            name: "Arrow".to_owned(),
            archetype: Archetype::Physical,
            levels: vec![LevelStats {
                cost: 100,
                damage: 60.0,
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

fn forked_map() -> MapConfig {
    MapConfig {
        id: "test_fork".to_owned(),
        name: "Test Fork".to_owned(),
        seed: 42,
        starting_coins: 100_000,
        starting_xp: 0,
        leak_penalty: LeakPenalty { coins: 50, xp: 4 },
        enemy_scale: Default::default(),
        xp_wave_bonus: 0,
        xp_map_bonus: 0,
        clear_reward: Default::default(),
        routes: vec![
            RouteConfig {
                id: "north".to_owned(),
                waypoints: vec![DVec2::new(0.0, 0.5), DVec2::new(0.5, 0.3), DVec2::new(1.0, 0.3)],
            },
            RouteConfig {
                id: "south".to_owned(),
                waypoints: vec![DVec2::new(0.0, 0.5), DVec2::new(0.5, 0.7), DVec2::new(1.0, 0.7)],
            },
        ],
        route_weights: vec![0.6, 0.4],
        slot_activation_cost: 10,
        slot_clearance_px: None,
        build_slots: vec![SlotConfig {
            id: "s01".to_owned(),
            position: DVec2::new(0.05, 0.42),
            activation_cost: None,
        }],
        waves: vec![
            WaveConfig {
                spawn_interval: 0.5,
                composition: vec![SpawnGroup {
                    enemy: "scout".to_owned(),
                    count: 6,
                }],
                route_weights: None,
            },
            WaveConfig {
                spawn_interval: 0.4,
                composition: vec![SpawnGroup {
                    enemy: "scout".to_owned(),
                    count: 4,
                }],
                route_weights: Some(vec![0.0, 1.0]),
            },
        ],
    }
}

fn game() -> Game {
    let map = forked_map();
    let maps = MapSet {
        default_map: map.id.clone(),
        maps: vec![map],
    };
    Game::new(ruleset(), maps).expect("valid campaign")
}

fn run_wave_to_completion(game: &mut Game) {
    for _ in 0..10_000 {
        if query::snapshot(game).phase != Phase::WaveRunning {
            return;
        }
        game.tick(0.1);
    }
    panic!("wave did not terminate");
}

#[test]
fn wave_lifecycle_walks_build_result_and_terminal_phases() {
    let mut game = game();
    assert_eq!(query::snapshot(&game).phase, Phase::BuildPhase);
    assert_eq!(game.start_next_wave(), Ok(0));
    assert_eq!(query::snapshot(&game).phase, Phase::WaveRunning);
    assert_eq!(game.start_next_wave(), Err(WaveError::InvalidPhase));

    run_wave_to_completion(&mut game);
    assert_eq!(query::snapshot(&game).phase, Phase::WaveResult);
    assert_eq!(game.start_next_wave(), Ok(1));
    run_wave_to_completion(&mut game);

    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.phase, Phase::MapResult);
    assert!(snapshot.outcome.expect("terminal").victory);
    assert_eq!(game.start_next_wave(), Err(WaveError::InvalidPhase));
}

#[test]
fn a_map_without_waves_has_none_to_start() {
    let mut map = forked_map();
    map.waves.clear();
    let maps = MapSet {
        default_map: map.id.clone(),
        maps: vec![map],
    };
    let mut game = Game::new(ruleset(), maps).expect("valid campaign");
    assert_eq!(game.start_next_wave(), Err(WaveError::NoWavesRemaining));
    assert_eq!(query::snapshot(&game).phase, Phase::BuildPhase);
}

#[test]
fn every_spawned_unit_is_either_killed_or_leaked() {
    let mut game = game();
    let _ = game.activate_slot("s01").expect("activate");
    let _ = game.build_tower("s01", "arrow").expect("build");
    let _ = game.start_next_wave().expect("wave 0");
    run_wave_to_completion(&mut game);

    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.stats.spawned, 6);
    assert_eq!(
        snapshot.stats.spawned,
        snapshot.stats.killed + snapshot.stats.leaked
    );
    assert_eq!(snapshot.units_remaining, 0);
}

#[test]
fn per_wave_weights_override_the_map_default() {
    let mut game = game();
    let _ = game.start_next_wave().expect("wave 0");
    run_wave_to_completion(&mut game);
    let _ = game.start_next_wave().expect("wave 1");
    game.tick(2.0);
    // Wave 1 weights route everything onto the southern branch.
    let units = query::units(&game);
    assert!(!units.is_empty());
    assert!(units.iter().all(|unit| unit.route == 1));
}

#[test]
fn identical_seeds_replay_identically() {
    let mut first = game();
    let mut second = game();
    for game in [&mut first, &mut second] {
        let _ = game.activate_slot("s01").expect("activate");
        let _ = game.build_tower("s01", "arrow").expect("build");
        let _ = game.start_next_wave().expect("wave 0");
        for _ in 0..40 {
            game.tick(0.13);
        }
    }
    assert_eq!(query::snapshot(&first), query::snapshot(&second));
    assert_eq!(query::units(&first), query::units(&second));
}

#[test]
fn bankruptcy_mid_wave_is_an_immediate_defeat() {
    let mut map = forked_map();
    map.starting_coins = 40;
    let maps = MapSet {
        default_map: map.id.clone(),
        maps: vec![map],
    };
    let mut game = Game::new(ruleset(), maps).expect("valid campaign");
    let _ = game.start_next_wave().expect("wave 0");
    run_wave_to_completion(&mut game);

    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.phase, Phase::MapResult);
    assert!(!snapshot.outcome.expect("terminal").victory);
    assert!(snapshot.coins < 0);
}

#[derive(Debug)]
struct FixedOffload {
    report: WaveReport,
}

impl WaveOffload for FixedOffload {
    fn simulate_wave(&mut self, _payload: &WavePayload) -> Result<WaveReport, OffloadError> {
        Ok(self.report.clone())
    }
}

#[derive(Debug)]
struct FailingOffload;

impl WaveOffload for FailingOffload {
    fn simulate_wave(&mut self, _payload: &WavePayload) -> Result<WaveReport, OffloadError> {
        Err(OffloadError::StreamClosed)
    }
}

#[test]
fn offload_collapses_the_wave_into_one_exchange() {
    let mut game = game();
    let _ = game.activate_slot("s01").expect("activate");
    let _ = game.build_tower("s01", "arrow").expect("build");
    game.set_offload(Box::new(FixedOffload {
        report: WaveReport {
            coins: 99_500,
            xp: 12,
            leaked: 1,
            killed: 5,
            defeat: false,
            cooldowns: vec![(0, 0.9)],
            zones: Vec::new(),
        },
    }));

    let _ = game.start_next_wave().expect("wave 0");
    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.phase, Phase::WaveResult);
    assert_eq!(snapshot.stats.spawned, 6);
    assert_eq!(snapshot.stats.killed, 5);
    assert_eq!(snapshot.stats.leaked, 1);
    // The report's economy lands first, then the wave-clear bonus.
    assert_eq!(snapshot.coins, 99_500);
    assert_eq!(snapshot.xp, 12 + 5);
    assert_eq!(snapshot.units_remaining, 0);
    assert_eq!(query::tower_at(&game, "s01").expect("tower").cooldown, 0.9);
}

#[test]
fn offload_defeat_flag_ends_the_map() {
    let mut game = game();
    game.set_offload(Box::new(FixedOffload {
        report: WaveReport {
            coins: -25,
            xp: 0,
            leaked: 6,
            killed: 0,
            defeat: true,
            cooldowns: Vec::new(),
            zones: Vec::new(),
        },
    }));
    let _ = game.start_next_wave().expect("wave 0");
    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.phase, Phase::MapResult);
    assert!(!snapshot.outcome.expect("terminal").victory);
}

#[test]
fn offload_failure_falls_back_to_local_stepping_for_good() {
    let mut game = game();
    game.set_offload(Box::new(FailingOffload));
    assert!(game.offload_enabled());

    let _ = game.start_next_wave().expect("wave 0");
    assert!(!game.offload_enabled());
    assert_eq!(query::snapshot(&game).phase, Phase::WaveRunning);

    run_wave_to_completion(&mut game);
    assert_eq!(query::snapshot(&game).phase, Phase::WaveResult);
    assert_eq!(query::snapshot(&game).stats.spawned, 6);
}

#[test]
fn builtin_campaign_loads_and_plays_its_first_wave() {
    let mut game = Game::new(riverguard_campaign::ruleset(), riverguard_campaign::maps())
        .expect("builtin campaign");
    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.map_id, riverguard_campaign::FIRST_MAP_ID);
    assert!(!query::slots(&game).is_empty());

    let _ = game.start_next_wave().expect("wave 0");
    run_wave_to_completion(&mut game);
    let snapshot = query::snapshot(&game);
    assert!(matches!(snapshot.phase, Phase::WaveResult | Phase::MapResult));
    assert!(snapshot.stats.spawned > 0);
}

#[test]
fn switching_maps_reinitializes_the_scenario() {
    let mut game = Game::new(riverguard_campaign::ruleset(), riverguard_campaign::maps())
        .expect("builtin campaign");
    let _ = game.start_next_wave().expect("wave 0");
    game.tick(1.0);
    game.set_map("map_02_split_delta").expect("known map");
    let snapshot = query::snapshot(&game);
    assert_eq!(snapshot.map_id, "map_02_split_delta");
    assert_eq!(snapshot.phase, Phase::BuildPhase);
    assert_eq!(snapshot.stats.spawned, 0);
    assert_eq!(snapshot.units_remaining, 0);

    assert!(game.set_map("map_99_nowhere").is_err());
}
