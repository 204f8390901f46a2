#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Built-in campaign data for the Riverguard engine.
//!
//! Provides the static configuration the engine consumes: three river maps
//! (routes, build slots, wave plans, economy constants), the five tower level
//! tables, and the enemy templates. Everything here is plain data over
//! `riverguard-core` types; hosts may substitute their own configuration.

mod levels;

pub use levels::MAX_TOWER_LEVEL;

use glam::DVec2;
use riverguard_core::{
    EnemyScale, EnemySpec, LeakPenalty, MapConfig, MapSet, Progression, RouteConfig, Ruleset,
    SlotConfig, SpawnGroup, WaveConfig,
};

/// Identifier of the campaign's first map.
pub const FIRST_MAP_ID: &str = "map_01_river_bend";

/// Builds the tower table, enemy templates, and progression constants.
#[must_use]
pub fn ruleset() -> Ruleset {
    Ruleset {
        towers: levels::tower_table(),
        enemies: enemy_table(),
        progression: Progression {
            xp_per_wave_clear: 28,
            xp_map_clear: 140,
        },
    }
}

/// Builds the three-map campaign in unlock order.
#[must_use]
pub fn maps() -> MapSet {
    MapSet {
        maps: vec![river_bend(), split_delta(), marsh_maze()],
        default_map: FIRST_MAP_ID.to_owned(),
    }
}

fn enemy_table() -> Vec<EnemySpec> {
    let enemy = |id: &str, hp: f64, speed: f64, coin_reward: i64, xp_reward: i64| EnemySpec {
        id: id.to_owned(),
        hp,
        speed,
        coin_reward,
        xp_reward,
    };
    vec![
        enemy("scout", 220.0, 1.4, 75, 7),
        enemy("raider", 390.0, 1.07, 115, 11),
        enemy("barge", 690.0, 0.82, 175, 17),
        enemy("juggernaut", 1100.0, 0.66, 280, 26),
    ]
}

/// Per-wave growth parameters used to generate a map's wave plan.
struct WavePlan {
    total_waves: u32,
    spawn_start: f64,
    spawn_floor: f64,
    route_weights: Vec<f64>,
    base: [f64; 4],
    growth: [f64; 4],
    surge_every: u32,
    surge_boost: f64,
}

/// Expands a growth curve into concrete wave compositions.
///
/// Every `surge_every`-th wave receives a flat boost that tapers for the
/// heavier unit types so late surges stay survivable.
fn build_waves(plan: &WavePlan) -> Vec<WaveConfig> {
    const ENEMY_IDS: [&str; 4] = ["scout", "raider", "barge", "juggernaut"];
    const SURGE_FACTOR: [f64; 4] = [1.0, 0.8, 0.5, 0.22];

    let mut waves = Vec::with_capacity(plan.total_waves as usize);
    for wave_number in 1..=plan.total_waves {
        let t = f64::from(wave_number - 1);
        let surge = if wave_number % plan.surge_every == 0 {
            plan.surge_boost
        } else {
            0.0
        };

        let mut composition = Vec::new();
        for (index, enemy_id) in ENEMY_IDS.iter().enumerate() {
            let count =
                (plan.base[index] + plan.growth[index] * t + surge * SURGE_FACTOR[index]).round();
            let count = count.max(0.0) as u32;
            // The heaviest type only joins once the curve produces units.
            if count > 0 || index < 3 {
                composition.push(SpawnGroup {
                    enemy: (*enemy_id).to_owned(),
                    count,
                });
            }
        }

        let interval = (plan.spawn_start - f64::from(wave_number) * 0.018).max(plan.spawn_floor);
        waves.push(WaveConfig {
            spawn_interval: (interval * 1000.0).round() / 1000.0,
            composition,
            route_weights: Some(plan.route_weights.clone()),
        });
    }
    waves
}

fn route(id: &str, waypoints: &[(f64, f64)]) -> RouteConfig {
    RouteConfig {
        id: id.to_owned(),
        waypoints: waypoints.iter().map(|&(x, y)| DVec2::new(x, y)).collect(),
    }
}

fn slots(entries: &[(&str, f64, f64)]) -> Vec<SlotConfig> {
    entries
        .iter()
        .map(|&(id, x, y)| SlotConfig {
            id: id.to_owned(),
            position: DVec2::new(x, y),
            activation_cost: None,
        })
        .collect()
}

fn river_bend() -> MapConfig {
    let route_weights = vec![0.56, 0.44];
    MapConfig {
        id: FIRST_MAP_ID.to_owned(),
        name: "Map 1 - River Bend".to_owned(),
        seed: 101,
        starting_coins: 10_000,
        starting_xp: 0,
        leak_penalty: LeakPenalty { coins: 145, xp: 8 },
        enemy_scale: EnemyScale::default(),
        xp_wave_bonus: 14,
        xp_map_bonus: 190,
        clear_reward: Default::default(),
        routes: vec![
            route(
                "main",
                &[
                    (0.03, 0.66),
                    (0.15, 0.62),
                    (0.29, 0.52),
                    (0.46, 0.47),
                    (0.62, 0.44),
                    (0.78, 0.39),
                    (0.96, 0.35),
                ],
            ),
            route(
                "detour",
                &[
                    (0.03, 0.66),
                    (0.12, 0.58),
                    (0.25, 0.4),
                    (0.43, 0.35),
                    (0.58, 0.42),
                    (0.74, 0.49),
                    (0.96, 0.35),
                ],
            ),
        ],
        route_weights: route_weights.clone(),
        slot_activation_cost: 0,
        slot_clearance_px: None,
        build_slots: slots(&[
            ("s01", 0.1, 0.48),
            ("s02", 0.12, 0.77),
            ("s03", 0.2, 0.54),
            ("s04", 0.26, 0.68),
            ("s05", 0.33, 0.44),
            ("s06", 0.39, 0.62),
            ("s07", 0.48, 0.36),
            ("s08", 0.54, 0.56),
            ("s09", 0.62, 0.33),
            ("s10", 0.68, 0.57),
            ("s11", 0.77, 0.31),
            ("s12", 0.82, 0.51),
            ("s13", 0.9, 0.27),
            ("s14", 0.92, 0.47),
        ]),
        waves: build_waves(&WavePlan {
            total_waves: 16,
            spawn_start: 1.0,
            spawn_floor: 0.48,
            route_weights,
            base: [5.0, 3.0, 1.0, 0.0],
            growth: [0.35, 0.28, 0.15, 0.03],
            surge_every: 4,
            surge_boost: 2.0,
        }),
    }
}

fn split_delta() -> MapConfig {
    let route_weights = vec![0.36, 0.42, 0.22];
    MapConfig {
        id: "map_02_split_delta".to_owned(),
        name: "Map 2 - Split Delta".to_owned(),
        seed: 209,
        starting_coins: 12_000,
        starting_xp: 0,
        leak_penalty: LeakPenalty { coins: 170, xp: 10 },
        enemy_scale: EnemyScale {
            hp: 1.13,
            speed: 1.04,
            rewards: 1.22,
        },
        xp_wave_bonus: 20,
        xp_map_bonus: 300,
        clear_reward: Default::default(),
        routes: vec![
            route(
                "north",
                &[
                    (0.03, 0.71),
                    (0.16, 0.64),
                    (0.25, 0.51),
                    (0.35, 0.38),
                    (0.52, 0.31),
                    (0.72, 0.25),
                    (0.95, 0.23),
                ],
            ),
            route(
                "center",
                &[
                    (0.03, 0.71),
                    (0.18, 0.66),
                    (0.34, 0.6),
                    (0.5, 0.52),
                    (0.67, 0.46),
                    (0.82, 0.42),
                    (0.95, 0.39),
                ],
            ),
            route(
                "south_detour",
                &[
                    (0.03, 0.71),
                    (0.14, 0.78),
                    (0.28, 0.82),
                    (0.47, 0.75),
                    (0.63, 0.64),
                    (0.78, 0.53),
                    (0.95, 0.39),
                ],
            ),
        ],
        route_weights: route_weights.clone(),
        slot_activation_cost: 0,
        slot_clearance_px: None,
        build_slots: slots(&[
            ("s01", 0.09, 0.56),
            ("s02", 0.11, 0.84),
            ("s03", 0.19, 0.47),
            ("s04", 0.23, 0.74),
            ("s05", 0.29, 0.36),
            ("s06", 0.33, 0.66),
            ("s07", 0.41, 0.29),
            ("s08", 0.45, 0.59),
            ("s09", 0.53, 0.24),
            ("s10", 0.57, 0.56),
            ("s11", 0.65, 0.3),
            ("s12", 0.69, 0.61),
            ("s13", 0.77, 0.25),
            ("s14", 0.81, 0.57),
            ("s15", 0.88, 0.28),
            ("s16", 0.9, 0.52),
        ]),
        waves: build_waves(&WavePlan {
            total_waves: 18,
            spawn_start: 0.94,
            spawn_floor: 0.4,
            route_weights,
            base: [6.0, 4.0, 1.0, 0.0],
            growth: [0.45, 0.35, 0.18, 0.05],
            surge_every: 3,
            surge_boost: 2.0,
        }),
    }
}

fn marsh_maze() -> MapConfig {
    let route_weights = vec![0.31, 0.36, 0.18, 0.15];
    MapConfig {
        id: "map_03_marsh_maze".to_owned(),
        name: "Map 3 - Marsh Maze".to_owned(),
        seed: 317,
        starting_coins: 14_000,
        starting_xp: 0,
        leak_penalty: LeakPenalty { coins: 220, xp: 14 },
        enemy_scale: EnemyScale {
            hp: 1.25,
            speed: 1.09,
            rewards: 1.4,
        },
        xp_wave_bonus: 28,
        xp_map_bonus: 460,
        clear_reward: Default::default(),
        routes: vec![
            route(
                "north_channel",
                &[
                    (0.03, 0.57),
                    (0.12, 0.45),
                    (0.25, 0.33),
                    (0.42, 0.27),
                    (0.58, 0.23),
                    (0.78, 0.22),
                    (0.96, 0.19),
                ],
            ),
            route(
                "center_channel",
                &[
                    (0.03, 0.57),
                    (0.16, 0.55),
                    (0.28, 0.5),
                    (0.4, 0.47),
                    (0.57, 0.44),
                    (0.74, 0.42),
                    (0.96, 0.4),
                ],
            ),
            route(
                "south_wide",
                &[
                    (0.03, 0.57),
                    (0.13, 0.69),
                    (0.28, 0.78),
                    (0.47, 0.74),
                    (0.65, 0.66),
                    (0.82, 0.56),
                    (0.96, 0.4),
                ],
            ),
            route(
                "deep_detour",
                &[
                    (0.03, 0.57),
                    (0.09, 0.78),
                    (0.2, 0.89),
                    (0.39, 0.88),
                    (0.56, 0.8),
                    (0.74, 0.66),
                    (0.96, 0.4),
                ],
            ),
        ],
        route_weights: route_weights.clone(),
        slot_activation_cost: 0,
        slot_clearance_px: None,
        build_slots: slots(&[
            ("s01", 0.07, 0.37),
            ("s02", 0.09, 0.69),
            ("s03", 0.16, 0.29),
            ("s04", 0.19, 0.63),
            ("s05", 0.26, 0.24),
            ("s06", 0.3, 0.58),
            ("s07", 0.37, 0.21),
            ("s08", 0.41, 0.55),
            ("s09", 0.5, 0.19),
            ("s10", 0.53, 0.53),
            ("s11", 0.62, 0.19),
            ("s12", 0.65, 0.52),
            ("s13", 0.74, 0.2),
            ("s14", 0.77, 0.51),
            ("s15", 0.84, 0.23),
            ("s16", 0.87, 0.5),
            ("s17", 0.93, 0.27),
            ("s18", 0.94, 0.48),
        ]),
        waves: build_waves(&WavePlan {
            total_waves: 20,
            spawn_start: 0.88,
            spawn_floor: 0.34,
            route_weights,
            base: [6.0, 5.0, 2.0, 1.0],
            growth: [0.5, 0.42, 0.22, 0.08],
            surge_every: 3,
            surge_boost: 3.0,
        }),
    }
}
