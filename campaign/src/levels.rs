//! Tower level tables generated from per-tower anchor curves.
//!
//! Each tower defines six anchor values per parameter; intermediate levels
//! are linearly interpolated between the surrounding anchors so the whole
//! 1..=50 table stays smooth without hand-tuning every level.

use riverguard_core::{Archetype, LevelStats, TowerSpec};

/// Highest level any tower can reach.
pub const MAX_TOWER_LEVEL: u32 = 50;

/// Levels at which anchor values are pinned.
const ANCHOR_LEVELS: [u32; 6] = [1, 10, 20, 30, 40, 50];

fn interpolate(level: u32, anchors: [f64; 6]) -> f64 {
    if level <= ANCHOR_LEVELS[0] {
        return anchors[0];
    }

    for window in 1..ANCHOR_LEVELS.len() {
        let left_level = ANCHOR_LEVELS[window - 1];
        let right_level = ANCHOR_LEVELS[window];
        if level <= right_level {
            let t = f64::from(level - left_level) / f64::from(right_level - left_level);
            return anchors[window - 1] + (anchors[window] - anchors[window - 1]) * t;
        }
    }

    anchors[anchors.len() - 1]
}

fn int_from(level: u32, anchors: [f64; 6]) -> f64 {
    interpolate(level, anchors).round()
}

fn float_from(level: u32, anchors: [f64; 6]) -> f64 {
    (interpolate(level, anchors) * 100.0).round() / 100.0
}

/// Costs snap to the nearest multiple of five with a floor of sixty coins.
fn cost_from(level: u32, anchors: [f64; 6]) -> i64 {
    let raw = (int_from(level, anchors) / 5.0).round() * 5.0;
    (raw as i64).max(60)
}

fn arrow_level(level: u32) -> LevelStats {
    LevelStats {
        cost: cost_from(level, [420.0, 740.0, 1380.0, 2450.0, 4000.0, 6500.0]),
        damage: int_from(level, [42.0, 120.0, 230.0, 360.0, 520.0, 720.0]),
        range: float_from(level, [2.9, 3.12, 3.34, 3.56, 3.78, 4.0]),
        attack_speed: float_from(level, [1.18, 1.6, 2.02, 2.45, 2.8, 3.2]),
        ..LevelStats::default()
    }
}

fn bomb_level(level: u32) -> LevelStats {
    LevelStats {
        cost: cost_from(level, [700.0, 1400.0, 2600.0, 4700.0, 8200.0, 14000.0]),
        damage: int_from(level, [120.0, 220.0, 360.0, 540.0, 760.0, 980.0]),
        range: float_from(level, [2.6, 2.75, 2.9, 3.05, 3.2, 3.35]),
        attack_speed: float_from(level, [0.52, 0.64, 0.77, 0.9, 1.03, 1.16]),
        splash_radius: float_from(level, [1.4, 1.6, 1.85, 2.1, 2.35, 2.6]),
        splash_falloff: int_from(level, [45.0, 44.0, 42.0, 40.0, 37.0, 34.0]),
        ..LevelStats::default()
    }
}

fn fire_level(level: u32) -> LevelStats {
    LevelStats {
        cost: cost_from(level, [860.0, 2150.0, 4100.0, 7600.0, 13000.0, 22000.0]),
        damage: int_from(level, [45.0, 60.0, 88.0, 124.0, 166.0, 220.0]),
        range: float_from(level, [2.8, 3.0, 3.2, 3.4, 3.6, 3.8]),
        attack_speed: float_from(level, [0.72, 0.86, 0.98, 1.1, 1.22, 1.34]),
        burn_dps: int_from(level, [30.0, 44.0, 66.0, 94.0, 128.0, 170.0]),
        burn_duration: 2.4,
        zone_dps: int_from(level, [44.0, 62.0, 92.0, 130.0, 178.0, 238.0]),
        zone_duration: 3.0,
        zone_radius: float_from(level, [0.72, 0.82, 0.92, 1.0, 1.1, 1.18]),
        ..LevelStats::default()
    }
}

fn wind_targets(level: u32) -> u32 {
    if level <= 17 {
        3
    } else if level <= 34 {
        5
    } else {
        6
    }
}

fn wind_level(level: u32) -> LevelStats {
    LevelStats {
        cost: cost_from(level, [760.0, 1400.0, 2600.0, 4700.0, 8200.0, 14000.0]),
        damage: int_from(level, [18.0, 70.0, 140.0, 220.0, 320.0, 440.0]),
        range: float_from(level, [3.1, 3.35, 3.6, 3.85, 4.1, 4.3]),
        attack_speed: float_from(level, [0.96, 1.24, 1.52, 1.8, 2.1, 2.35]),
        slow_percent: int_from(level, [40.0, 56.0, 68.0, 76.0, 84.0, 90.0]),
        slow_duration: float_from(level, [2.2, 2.8, 3.3, 3.8, 4.3, 4.8]),
        control_targets: wind_targets(level),
        ..LevelStats::default()
    }
}

fn chain_count(level: u32) -> u32 {
    if level <= 20 {
        1
    } else if level <= 35 {
        2
    } else if level <= 45 {
        3
    } else {
        4
    }
}

fn lightning_level(level: u32) -> LevelStats {
    LevelStats {
        cost: cost_from(level, [900.0, 1600.0, 3000.0, 5600.0, 10200.0, 18000.0]),
        damage: int_from(level, [58.0, 122.0, 220.0, 360.0, 530.0, 760.0]),
        range: float_from(level, [2.8, 3.0, 3.2, 3.4, 3.6, 3.8]),
        attack_speed: float_from(level, [0.8, 0.96, 1.12, 1.28, 1.44, 1.58]),
        chain_count: chain_count(level),
        chain_falloff: int_from(level, [35.0, 32.0, 28.0, 24.0, 20.0, 16.0]),
        shock_duration: 0.58,
        ..LevelStats::default()
    }
}

fn build_table(builder: fn(u32) -> LevelStats) -> Vec<LevelStats> {
    (1..=MAX_TOWER_LEVEL).map(builder).collect()
}

fn tower(id: &str, name: &str, archetype: Archetype, builder: fn(u32) -> LevelStats) -> TowerSpec {
    TowerSpec {
        id: id.to_owned(),
        name: name.to_owned(),
        archetype,
        levels: build_table(builder),
    }
}

/// All five built-in tower types in wire-index order.
pub(crate) fn tower_table() -> Vec<TowerSpec> {
    vec![
        tower("arrow", "Arrow Tower", Archetype::Physical, arrow_level),
        tower("bomb", "Bomb Tower", Archetype::Splash, bomb_level),
        tower("fire", "Fire Tower", Archetype::Incendiary, fire_level),
        tower("wind", "Wind Tower", Archetype::AreaControl, wind_level),
        tower("lightning", "Lightning Tower", Archetype::Chain, lightning_level),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tower_has_a_full_level_table() {
        for spec in tower_table() {
            assert_eq!(spec.levels.len() as u32, MAX_TOWER_LEVEL, "{}", spec.id);
        }
    }

    #[test]
    fn costs_snap_to_multiples_of_five_with_a_floor() {
        for spec in tower_table() {
            for stats in &spec.levels {
                assert!(stats.cost >= 60, "{} cost {}", spec.id, stats.cost);
                assert_eq!(stats.cost % 5, 0, "{} cost {}", spec.id, stats.cost);
            }
        }
    }

    #[test]
    fn costs_never_decrease_with_level() {
        for spec in tower_table() {
            for pair in spec.levels.windows(2) {
                assert!(pair[0].cost <= pair[1].cost, "{}", spec.id);
            }
        }
    }

    #[test]
    fn anchor_levels_match_their_pinned_values() {
        let arrow = arrow_level(1);
        assert_eq!(arrow.damage, 42.0);
        assert_eq!(arrow.range, 2.9);

        let arrow = arrow_level(50);
        assert_eq!(arrow.damage, 720.0);
        assert_eq!(arrow.range, 4.0);
    }

    #[test]
    fn wind_target_count_steps_with_level() {
        assert_eq!(wind_level(17).control_targets, 3);
        assert_eq!(wind_level(18).control_targets, 5);
        assert_eq!(wind_level(34).control_targets, 5);
        assert_eq!(wind_level(35).control_targets, 6);
    }

    #[test]
    fn chain_count_steps_with_level() {
        assert_eq!(lightning_level(20).chain_count, 1);
        assert_eq!(lightning_level(21).chain_count, 2);
        assert_eq!(lightning_level(36).chain_count, 3);
        assert_eq!(lightning_level(46).chain_count, 4);
    }
}
