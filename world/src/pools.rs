//! Struct-of-arrays storage for the entities that dominate tick time.
//!
//! Hostile units and ground zones are stored as parallel columns indexed by a
//! dense slot; removal swaps the last entry in so iteration stays branch-free
//! and allocation-free during a wave.

use glam::DVec2;
use riverguard_core::{SpawnRecord, ZoneRecord};

/// Dense columnar pool of live hostile units.
///
/// Every column has identical length; an index is only valid until the next
/// [`EnemyPool::swap_remove`].
#[derive(Debug, Default)]
pub(crate) struct EnemyPool {
    /// Remaining hit points; a unit at or below zero is culled on the next
    /// effects pass.
    pub(crate) hp: Vec<f64>,
    /// Base travel speed in world units per second, before slows.
    pub(crate) speed: Vec<f64>,
    /// Arc-length progress along the assigned route in world units.
    pub(crate) distance: Vec<f64>,
    /// Cached position in normalized map space, refreshed each tick.
    pub(crate) position: Vec<DVec2>,
    /// Index of the assigned route.
    pub(crate) route: Vec<usize>,
    /// Coins granted on kill, already map-scaled.
    pub(crate) coin_reward: Vec<i64>,
    /// Experience granted on kill, already map-scaled.
    pub(crate) xp_reward: Vec<i64>,
    /// Burn damage per second while the burn timer runs.
    pub(crate) burn_dps: Vec<f64>,
    /// Seconds of burn remaining.
    pub(crate) burn_remaining: Vec<f64>,
    /// Active slow percentage; zeroed when the slow timer expires.
    pub(crate) slow_percent: Vec<f64>,
    /// Seconds of slow remaining.
    pub(crate) slow_remaining: Vec<f64>,
    /// Seconds the shock marker persists; shocked units cannot be chained.
    pub(crate) shock_remaining: Vec<f64>,
}

impl EnemyPool {
    /// Number of live units.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.hp.len()
    }

    /// True when no units are alive.
    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.hp.is_empty()
    }

    /// Grows every column to hold at least `additional` more units.
    pub(crate) fn reserve(&mut self, additional: usize) {
        self.hp.reserve(additional);
        self.speed.reserve(additional);
        self.distance.reserve(additional);
        self.position.reserve(additional);
        self.route.reserve(additional);
        self.coin_reward.reserve(additional);
        self.xp_reward.reserve(additional);
        self.burn_dps.reserve(additional);
        self.burn_remaining.reserve(additional);
        self.slow_percent.reserve(additional);
        self.slow_remaining.reserve(additional);
        self.shock_remaining.reserve(additional);
    }

    /// Appends a freshly spawned unit at the entry of its route.
    pub(crate) fn spawn(&mut self, record: &SpawnRecord, entry: DVec2) {
        self.hp.push(record.hp);
        self.speed.push(record.speed);
        self.distance.push(0.0);
        self.position.push(entry);
        self.route.push(record.route_index);
        self.coin_reward.push(record.coin_reward);
        self.xp_reward.push(record.xp_reward);
        self.burn_dps.push(0.0);
        self.burn_remaining.push(0.0);
        self.slow_percent.push(0.0);
        self.slow_remaining.push(0.0);
        self.shock_remaining.push(0.0);
    }

    /// Removes the unit at `index`, moving the last unit into its place.
    pub(crate) fn swap_remove(&mut self, index: usize) {
        let _ = self.hp.swap_remove(index);
        let _ = self.speed.swap_remove(index);
        let _ = self.distance.swap_remove(index);
        let _ = self.position.swap_remove(index);
        let _ = self.route.swap_remove(index);
        let _ = self.coin_reward.swap_remove(index);
        let _ = self.xp_reward.swap_remove(index);
        let _ = self.burn_dps.swap_remove(index);
        let _ = self.burn_remaining.swap_remove(index);
        let _ = self.slow_percent.swap_remove(index);
        let _ = self.slow_remaining.swap_remove(index);
        let _ = self.shock_remaining.swap_remove(index);
    }

    /// Drops every unit, keeping column capacity for the next wave.
    pub(crate) fn clear(&mut self) {
        self.hp.clear();
        self.speed.clear();
        self.distance.clear();
        self.position.clear();
        self.route.clear();
        self.coin_reward.clear();
        self.xp_reward.clear();
        self.burn_dps.clear();
        self.burn_remaining.clear();
        self.slow_percent.clear();
        self.slow_remaining.clear();
        self.shock_remaining.clear();
    }
}

/// Dense columnar pool of lingering ground zones.
#[derive(Debug, Default)]
pub(crate) struct ZonePool {
    /// Zone center in normalized map space.
    pub(crate) center: Vec<DVec2>,
    /// Damage radius in world units.
    pub(crate) radius: Vec<f64>,
    /// Damage per second inside the radius.
    pub(crate) dps: Vec<f64>,
    /// Seconds before the zone expires.
    pub(crate) remaining: Vec<f64>,
}

impl ZonePool {
    /// Number of active zones.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.remaining.len()
    }

    /// Appends a new zone.
    pub(crate) fn push(&mut self, zone: ZoneRecord) {
        self.center.push(zone.center);
        self.radius.push(zone.radius);
        self.dps.push(zone.dps);
        self.remaining.push(zone.duration);
    }

    /// Removes the zone at `index`, moving the last zone into its place.
    pub(crate) fn swap_remove(&mut self, index: usize) {
        let _ = self.center.swap_remove(index);
        let _ = self.radius.swap_remove(index);
        let _ = self.dps.swap_remove(index);
        let _ = self.remaining.swap_remove(index);
    }

    /// Drops every zone.
    pub(crate) fn clear(&mut self) {
        self.center.clear();
        self.radius.clear();
        self.dps.clear();
        self.remaining.clear();
    }

    /// Snapshots every zone for the offload payload.
    #[must_use]
    pub(crate) fn records(&self) -> Vec<ZoneRecord> {
        (0..self.len())
            .map(|index| ZoneRecord {
                center: self.center[index],
                radius: self.radius[index],
                dps: self.dps[index],
                duration: self.remaining[index],
            })
            .collect()
    }

    /// Replaces the pool contents with `records`, as returned by offload.
    pub(crate) fn restore(&mut self, records: &[ZoneRecord]) {
        self.clear();
        for record in records {
            self.push(*record);
        }
    }
}
