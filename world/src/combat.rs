//! Targeting and effect resolution for tower attacks.
//!
//! Every function here operates on pool indices with explicit borrows.
//! Damage is applied immediately, but units killed by an attack stay in the
//! pool until the next effects pass culls them and grants rewards.

use glam::DVec2;
use riverguard_core::{LevelStats, CHAIN_RADIUS, WORLD_SCALE};

use crate::pools::{EnemyPool, ZonePool};
use riverguard_core::ZoneRecord;

/// Hard cap on the slow percentage any unit can carry.
pub(crate) const MAX_SLOW_PERCENT: f64 = 84.0;

/// Shock marker duration used when a chain tower level configures none.
pub(crate) const DEFAULT_SHOCK_DURATION: f64 = 0.58;

/// Ground zone radius used when an incendiary level configures none.
pub(crate) const FALLBACK_ZONE_RADIUS: f64 = 1.0;

/// Ground zone duration used when an incendiary level configures none.
pub(crate) const FALLBACK_ZONE_DURATION: f64 = 3.0;

/// Distance between two normalized points, in world units.
pub(crate) fn world_distance(a: DVec2, b: DVec2) -> f64 {
    a.distance(b) * WORLD_SCALE
}

/// Travel speed after the active slow, floored by [`MAX_SLOW_PERCENT`].
pub(crate) fn effective_speed(base: f64, slow_percent: f64) -> f64 {
    base * (1.0 - slow_percent.min(MAX_SLOW_PERCENT) / 100.0)
}

fn progress(pool: &EnemyPool, route_lengths: &[f64], index: usize) -> f64 {
    let length = route_lengths[pool.route[index]];
    if length > 0.0 {
        pool.distance[index] / length
    } else {
        1.0
    }
}

/// Picks the in-range unit with the greatest fractional route progress.
///
/// Progress is `distance / route length` so units on short detours compete
/// fairly with units on long routes. Ties keep the earlier pool index, which
/// makes target selection stable across runs with identical state.
pub(crate) fn best_target(
    pool: &EnemyPool,
    route_lengths: &[f64],
    origin: DVec2,
    range: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for index in 0..pool.len() {
        if pool.hp[index] <= 0.0 {
            continue;
        }
        if world_distance(origin, pool.position[index]) > range {
            continue;
        }
        let candidate = progress(pool, route_lengths, index);
        match best {
            Some((_, leader)) if candidate <= leader => {}
            _ => best = Some((index, candidate)),
        }
    }
    best.map(|(index, _)| index)
}

/// Fills `out` with up to `limit` in-range units, greatest progress first.
pub(crate) fn top_targets(
    pool: &EnemyPool,
    route_lengths: &[f64],
    origin: DVec2,
    range: f64,
    limit: usize,
    out: &mut Vec<usize>,
) {
    out.clear();
    for index in 0..pool.len() {
        if pool.hp[index] <= 0.0 {
            continue;
        }
        if world_distance(origin, pool.position[index]) > range {
            continue;
        }
        out.push(index);
    }
    out.sort_unstable_by(|&a, &b| {
        progress(pool, route_lengths, b)
            .partial_cmp(&progress(pool, route_lengths, a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out.truncate(limit);
}

/// Direct hit plus reduced damage to every other unit near the impact.
pub(crate) fn apply_splash(pool: &mut EnemyPool, target: usize, stats: &LevelStats) {
    pool.hp[target] -= stats.damage;
    if stats.splash_radius <= 0.0 {
        return;
    }
    let impact = pool.position[target];
    let secondary = stats.damage * (1.0 - stats.splash_falloff / 100.0);
    for index in 0..pool.len() {
        if index == target || pool.hp[index] <= 0.0 {
            continue;
        }
        if world_distance(impact, pool.position[index]) <= stats.splash_radius {
            pool.hp[index] -= secondary;
        }
    }
}

/// Direct hit plus a burn status refresh and a lingering ground zone.
pub(crate) fn apply_incendiary(
    pool: &mut EnemyPool,
    zones: &mut ZonePool,
    target: usize,
    stats: &LevelStats,
) {
    pool.hp[target] -= stats.damage;
    if stats.burn_dps > 0.0 {
        // A weaker or shorter burn never downgrades an active one.
        pool.burn_dps[target] = pool.burn_dps[target].max(stats.burn_dps);
        pool.burn_remaining[target] = pool.burn_remaining[target].max(stats.burn_duration);
    }
    if stats.zone_dps > 0.0 {
        let radius = if stats.zone_radius > 0.0 {
            stats.zone_radius
        } else {
            FALLBACK_ZONE_RADIUS
        };
        let duration = if stats.zone_duration > 0.0 {
            stats.zone_duration
        } else {
            FALLBACK_ZONE_DURATION
        };
        zones.push(ZoneRecord {
            center: pool.position[target],
            radius,
            dps: stats.zone_dps,
            duration,
        });
    }
}

/// Damage plus a slow refresh applied to each unit in `targets`.
///
/// Both the percentage and the timer refresh to the stronger of the current
/// and incoming values, so overlapping towers never downgrade a slow.
pub(crate) fn apply_area_control(pool: &mut EnemyPool, targets: &[usize], stats: &LevelStats) {
    let incoming = stats.slow_percent.min(MAX_SLOW_PERCENT);
    for &index in targets {
        pool.hp[index] -= stats.damage;
        pool.slow_percent[index] = pool.slow_percent[index].max(incoming);
        pool.slow_remaining[index] = pool.slow_remaining[index].max(stats.slow_duration);
    }
}

/// Direct hit that arcs to the units nearest the primary target.
///
/// Up to `chain_count` secondary victims are chosen by distance from the
/// primary, all within [`CHAIN_RADIUS`], and each takes the same
/// falloff-reduced damage. The shock marker is purely visual: it never
/// excludes a unit from being arced to, and refreshes to the longer of the
/// current and incoming duration.
pub(crate) fn apply_chain(pool: &mut EnemyPool, target: usize, stats: &LevelStats) {
    let shock = if stats.shock_duration > 0.0 {
        stats.shock_duration
    } else {
        DEFAULT_SHOCK_DURATION
    };
    pool.hp[target] -= stats.damage;
    pool.shock_remaining[target] = pool.shock_remaining[target].max(shock);
    if stats.chain_count == 0 {
        return;
    }

    let origin = pool.position[target];
    let mut arcs: Vec<(usize, f64)> = Vec::new();
    for index in 0..pool.len() {
        if index == target || pool.hp[index] <= 0.0 {
            continue;
        }
        let gap = world_distance(origin, pool.position[index]);
        if gap <= CHAIN_RADIUS {
            arcs.push((index, gap));
        }
    }
    arcs.sort_unstable_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    arcs.truncate(stats.chain_count as usize);

    let secondary = stats.damage * (1.0 - stats.chain_falloff / 100.0);
    for (index, _) in arcs {
        pool.hp[index] -= secondary;
        pool.shock_remaining[index] = pool.shock_remaining[index].max(shock);
    }
}

/// Applies zone damage for this tick and compacts expired zones.
pub(crate) fn update_zones(pool: &mut EnemyPool, zones: &mut ZonePool, dt: f64) {
    let mut zone = 0;
    while zone < zones.len() {
        let center = zones.center[zone];
        let radius = zones.radius[zone];
        let damage = zones.dps[zone] * dt;
        for index in 0..pool.len() {
            if pool.hp[index] <= 0.0 {
                continue;
            }
            if world_distance(center, pool.position[index]) <= radius {
                pool.hp[index] -= damage;
            }
        }
        zones.remaining[zone] -= dt;
        if zones.remaining[zone] <= 0.0 {
            zones.swap_remove(zone);
        } else {
            zone += 1;
        }
    }
}

/// Advances burn, slow, and shock timers; burn deals its damage here.
pub(crate) fn decay_statuses(pool: &mut EnemyPool, dt: f64) {
    for index in 0..pool.len() {
        if pool.burn_remaining[index] > 0.0 {
            pool.hp[index] -= pool.burn_dps[index] * dt;
            pool.burn_remaining[index] -= dt;
            if pool.burn_remaining[index] <= 0.0 {
                pool.burn_dps[index] = 0.0;
                pool.burn_remaining[index] = 0.0;
            }
        }
        if pool.slow_remaining[index] > 0.0 {
            pool.slow_remaining[index] -= dt;
            if pool.slow_remaining[index] <= 0.0 {
                pool.slow_percent[index] = 0.0;
                pool.slow_remaining[index] = 0.0;
            }
        }
        if pool.shock_remaining[index] > 0.0 {
            pool.shock_remaining[index] = (pool.shock_remaining[index] - dt).max(0.0);
        }
    }
}

/// Culls dead units, returning their count and accumulated rewards.
pub(crate) fn remove_dead(pool: &mut EnemyPool) -> (u64, i64, i64) {
    let mut killed = 0;
    let mut coins = 0;
    let mut xp = 0;
    let mut index = 0;
    while index < pool.len() {
        if pool.hp[index] <= 0.0 {
            killed += 1;
            coins += pool.coin_reward[index];
            xp += pool.xp_reward[index];
            pool.swap_remove(index);
        } else {
            index += 1;
        }
    }
    (killed, coins, xp)
}
