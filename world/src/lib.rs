#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative wave-defense simulation for Riverguard.
//!
//! [`Game`] owns every pool and timer for one scenario: route geometry, the
//! slot board, the hostile-unit and ground-zone pools, the economy, and the
//! wave lifecycle state machine. Hosts mutate it through build and wave
//! operations and read it through the [`query`] module; expected rejections
//! come back as structured errors, never panics.

mod combat;
mod path;
mod pools;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use riverguard_core::{
    Archetype, AttackEvent, BuildError, CostBreakdown, GameSnapshot, LevelStats, MapConfig,
    MapOutcome, MapSet, Phase, Ruleset, ScenarioStats, SlotConfig, SpawnRecord, TowerRecord,
    TowerSnapshot, WaveError, WaveOffload, WavePayload, WaveReport,
    DEFAULT_SLOT_CLEARANCE_PX,
};
use thiserror::Error;

use crate::path::RoutePath;
use crate::pools::{EnemyPool, ZonePool};

/// Fixed per-tick delta handed to the offload process, before speed scaling.
const OFFLOAD_TICK_SECONDS: f64 = 0.06;

/// Bounds on the simulation speed multiplier.
const MIN_SPEED: f64 = 0.25;
const MAX_SPEED: f64 = 8.0;

/// Fraction of cumulative tower spend refunded when selling.
const SELL_REFUND_PERCENT: i64 = 70;

/// Configuration problems detected when a campaign is loaded.
///
/// These indicate broken data, not gameplay rejections, so they surface once
/// at construction or map selection rather than during play.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    /// The map set contains no maps.
    #[error("campaign contains no maps")]
    EmptyCampaign,
    /// No map carries the requested identifier.
    #[error("unknown map `{0}`")]
    UnknownMap(String),
    /// A route needs at least two waypoints to form a segment.
    #[error("route `{route}` on map `{map}` needs at least two waypoints")]
    DegenerateRoute {
        /// Map the route belongs to.
        map: String,
        /// Offending route identifier.
        route: String,
    },
    /// A weight list does not line up with the map's routes.
    #[error("map `{map}` declares {weights} route weights for {routes} routes")]
    WeightMismatch {
        /// Offending map identifier.
        map: String,
        /// Number of weights declared.
        weights: usize,
        /// Number of routes declared.
        routes: usize,
    },
    /// A wave composition names an enemy the ruleset does not define.
    #[error("map `{map}` spawns unknown enemy `{enemy}`")]
    UnknownEnemy {
        /// Offending map identifier.
        map: String,
        /// Unresolved enemy identifier.
        enemy: String,
    },
}

/// Runtime state of the defense unit occupying a slot.
#[derive(Clone, Copy, Debug)]
struct TowerState {
    type_index: usize,
    level: u32,
    cooldown: f64,
    invested: i64,
}

/// One buildable slot with its activation flag and occupant.
#[derive(Clone, Debug)]
struct BuildSlot {
    config: SlotConfig,
    active: bool,
    tower: Option<TowerState>,
}

/// Flat spawn queue for the running wave.
#[derive(Debug, Default)]
struct SpawnQueue {
    records: Vec<SpawnRecord>,
    cursor: usize,
    interval: f64,
    timer: f64,
}

impl SpawnQueue {
    fn remaining(&self) -> usize {
        self.records.len() - self.cursor
    }

    fn exhausted(&self) -> bool {
        self.cursor >= self.records.len()
    }

    fn clear(&mut self) {
        self.records.clear();
        self.cursor = 0;
        self.timer = 0.0;
    }
}

/// Read-only view of one buildable slot for presentation.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotView {
    /// Slot identifier.
    pub id: String,
    /// Position in normalized map space.
    pub position: DVec2,
    /// Coins required to activate the slot.
    pub activation_cost: i64,
    /// True once the slot has been activated.
    pub active: bool,
    /// True while a defense unit occupies the slot.
    pub occupied: bool,
}

/// Read-only view of one live hostile unit for presentation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitView {
    /// Position in normalized map space.
    pub position: DVec2,
    /// Remaining hit points.
    pub hp: f64,
    /// Index of the route the unit travels.
    pub route: usize,
}

/// One complete scenario: map, pools, economy, and lifecycle state.
#[derive(Debug)]
pub struct Game {
    ruleset: Ruleset,
    maps: MapSet,
    map_index: usize,
    routes: Vec<RoutePath>,
    route_lengths: Vec<f64>,
    slots: Vec<BuildSlot>,
    blocked: Vec<SlotConfig>,
    coins: i64,
    xp: i64,
    phase: Phase,
    wave_index: Option<usize>,
    spawn: SpawnQueue,
    enemies: EnemyPool,
    zones: ZonePool,
    stats: ScenarioStats,
    outcome: Option<MapOutcome>,
    rng: ChaCha8Rng,
    speed: f64,
    attacks: Vec<AttackEvent>,
    scratch: Vec<usize>,
    offload: Option<Box<dyn WaveOffload>>,
}

impl Game {
    /// Validates the campaign and loads its default map.
    pub fn new(ruleset: Ruleset, maps: MapSet) -> Result<Self, SetupError> {
        if maps.maps.is_empty() {
            return Err(SetupError::EmptyCampaign);
        }
        for map in &maps.maps {
            validate_map(&ruleset, map)?;
        }
        let map_index = maps
            .index_of(&maps.default_map)
            .ok_or_else(|| SetupError::UnknownMap(maps.default_map.clone()))?;

        let mut game = Self {
            ruleset,
            maps,
            map_index,
            routes: Vec::new(),
            route_lengths: Vec::new(),
            slots: Vec::new(),
            blocked: Vec::new(),
            coins: 0,
            xp: 0,
            phase: Phase::BuildPhase,
            wave_index: None,
            spawn: SpawnQueue::default(),
            enemies: EnemyPool::default(),
            zones: ZonePool::default(),
            stats: ScenarioStats::default(),
            outcome: None,
            rng: ChaCha8Rng::seed_from_u64(0),
            speed: 1.0,
            attacks: Vec::new(),
            scratch: Vec::new(),
            offload: None,
        };
        game.load(map_index, false);
        Ok(game)
    }

    /// Selects another map by id, reinitializing every pool.
    pub fn set_map(&mut self, map_id: &str) -> Result<(), SetupError> {
        let index = self
            .maps
            .index_of(map_id)
            .ok_or_else(|| SetupError::UnknownMap(map_id.to_owned()))?;
        self.load(index, false);
        Ok(())
    }

    /// Restarts the current map.
    ///
    /// With `keep_economy` the coin and experience balances survive the
    /// reset; everything else starts fresh.
    pub fn reset(&mut self, keep_economy: bool) {
        self.load(self.map_index, keep_economy);
    }

    /// Sets the simulation speed multiplier, clamped to a sane range.
    pub fn set_speed(&mut self, multiplier: f64) {
        if multiplier.is_finite() {
            self.speed = multiplier.clamp(MIN_SPEED, MAX_SPEED);
        }
    }

    /// Current simulation speed multiplier.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Installs a wave offload client.
    ///
    /// The client handles every subsequent wave until its first failure,
    /// which permanently reverts the scenario to local stepping.
    pub fn set_offload(&mut self, client: Box<dyn WaveOffload>) {
        self.offload = Some(client);
    }

    /// True while an offload client is installed and has not failed.
    #[must_use]
    pub fn offload_enabled(&self) -> bool {
        self.offload.is_some()
    }

    /// Activates a buildable slot, charging its activation cost.
    pub fn activate_slot(&mut self, slot_id: &str) -> Result<CostBreakdown, BuildError> {
        self.ensure_mutable()?;
        let index = self.slot_index(slot_id)?;
        if self.slots[index].active {
            return Err(BuildError::AlreadyActivated(slot_id.to_owned()));
        }
        let cost = self.activation_cost(index);
        self.charge(cost)?;
        self.slots[index].active = true;
        Ok(CostBreakdown {
            tower: 0,
            slot: cost,
            total: cost,
        })
    }

    /// Builds a level-1 defense unit of type `tower_id` on an active slot.
    pub fn build_tower(
        &mut self,
        slot_id: &str,
        tower_id: &str,
    ) -> Result<CostBreakdown, BuildError> {
        self.ensure_mutable()?;
        let index = self.slot_index(slot_id)?;
        let type_index = self
            .ruleset
            .tower_index(tower_id)
            .ok_or_else(|| BuildError::UnknownTower(tower_id.to_owned()))?;
        if !self.slots[index].active {
            return Err(BuildError::SlotInactive(slot_id.to_owned()));
        }
        if self.slots[index].tower.is_some() {
            return Err(BuildError::SlotOccupied(slot_id.to_owned()));
        }
        let cost = self.ruleset.towers[type_index].level(1).cost;
        self.charge(cost)?;
        self.slots[index].tower = Some(TowerState {
            type_index,
            level: 1,
            cooldown: 0.0,
            invested: cost,
        });
        Ok(CostBreakdown {
            tower: cost,
            slot: 0,
            total: cost,
        })
    }

    /// Raises the occupant of `slot_id` one level.
    pub fn upgrade_tower(&mut self, slot_id: &str) -> Result<CostBreakdown, BuildError> {
        self.ensure_mutable()?;
        let index = self.slot_index(slot_id)?;
        let Some(state) = self.slots[index].tower else {
            return Err(BuildError::SlotEmpty(slot_id.to_owned()));
        };
        let spec = &self.ruleset.towers[state.type_index];
        if state.level >= spec.max_level() {
            return Err(BuildError::MaxLevel);
        }
        let cost = spec.level(state.level + 1).cost;
        self.charge(cost)?;
        if let Some(state) = self.slots[index].tower.as_mut() {
            state.level += 1;
            state.invested += cost;
        }
        Ok(CostBreakdown {
            tower: cost,
            slot: 0,
            total: cost,
        })
    }

    /// Sells the occupant of `slot_id`, refunding part of its spend.
    ///
    /// The refund is a fixed fraction of every coin invested in the unit,
    /// builds and upgrades alike. The slot stays activated.
    pub fn sell_tower(&mut self, slot_id: &str) -> Result<i64, BuildError> {
        self.ensure_mutable()?;
        let index = self.slot_index(slot_id)?;
        let Some(state) = self.slots[index].tower.take() else {
            return Err(BuildError::SlotEmpty(slot_id.to_owned()));
        };
        let refund = state.invested * SELL_REFUND_PERCENT / 100;
        self.coins += refund;
        Ok(refund)
    }

    /// Starts the next configured wave, returning its zero-based index.
    ///
    /// With an offload client installed the whole wave is delegated at once;
    /// if the exchange fails the client is discarded and the wave proceeds
    /// through local ticks as if no client had been configured.
    pub fn start_next_wave(&mut self) -> Result<usize, WaveError> {
        if !matches!(self.phase, Phase::BuildPhase | Phase::WaveResult) {
            return Err(WaveError::InvalidPhase);
        }
        let next = self.wave_index.map_or(0, |index| index + 1);
        if next >= self.maps.maps[self.map_index].waves.len() {
            return Err(WaveError::NoWavesRemaining);
        }
        self.enqueue_wave(next);
        self.wave_index = Some(next);
        self.phase = Phase::WaveRunning;

        if self.offload.is_some() {
            self.run_offload();
        }
        Ok(next)
    }

    /// Advances the running wave by `elapsed` seconds of host time.
    ///
    /// The elapsed time is scaled by the speed multiplier; outside
    /// [`Phase::WaveRunning`] the call is a no-op.
    pub fn tick(&mut self, elapsed: f64) {
        if self.phase != Phase::WaveRunning || !elapsed.is_finite() || elapsed <= 0.0 {
            return;
        }
        let dt = elapsed * self.speed;
        self.attacks.clear();

        self.update_spawns(dt);
        self.refresh_positions();
        self.update_effects(dt);
        self.update_attacks(dt);
        self.update_movement(dt);
        self.resolve_wave_state();
    }

    fn map(&self) -> &MapConfig {
        &self.maps.maps[self.map_index]
    }

    fn load(&mut self, map_index: usize, keep_economy: bool) {
        self.map_index = map_index;
        let map = &self.maps.maps[map_index];

        self.routes = map
            .routes
            .iter()
            .map(|route| RoutePath::from_waypoints(&route.waypoints))
            .collect();
        self.route_lengths = self.routes.iter().map(RoutePath::length).collect();

        let clearance = map.slot_clearance_px.unwrap_or(DEFAULT_SLOT_CLEARANCE_PX);
        self.slots.clear();
        self.blocked.clear();
        for slot in &map.build_slots {
            let nearest = self
                .routes
                .iter()
                .map(|route| route.clearance_px(slot.position))
                .fold(f64::INFINITY, f64::min);
            if nearest < clearance {
                self.blocked.push(slot.clone());
            } else {
                self.slots.push(BuildSlot {
                    config: slot.clone(),
                    active: false,
                    tower: None,
                });
            }
        }

        if !keep_economy {
            self.coins = map.starting_coins;
            self.xp = map.starting_xp;
        }
        self.phase = Phase::BuildPhase;
        self.wave_index = None;
        self.spawn.clear();
        self.enemies.clear();
        self.zones.clear();
        self.stats = ScenarioStats::default();
        self.outcome = None;
        self.rng = ChaCha8Rng::seed_from_u64(map.seed);
        self.attacks.clear();
    }

    fn ensure_mutable(&self) -> Result<(), BuildError> {
        if self.phase == Phase::MapResult {
            return Err(BuildError::InvalidPhase);
        }
        Ok(())
    }

    fn slot_index(&self, slot_id: &str) -> Result<usize, BuildError> {
        self.slots
            .iter()
            .position(|slot| slot.config.id == slot_id)
            .ok_or_else(|| BuildError::UnknownSlot(slot_id.to_owned()))
    }

    fn activation_cost(&self, index: usize) -> i64 {
        self.slots[index]
            .config
            .activation_cost
            .unwrap_or(self.map().slot_activation_cost)
    }

    fn charge(&mut self, cost: i64) -> Result<(), BuildError> {
        if cost > self.coins {
            return Err(BuildError::InsufficientCoins {
                needed: cost,
                available: self.coins,
            });
        }
        self.coins -= cost;
        Ok(())
    }

    fn enqueue_wave(&mut self, wave_index: usize) {
        let map = &self.maps.maps[self.map_index];
        let wave = &map.waves[wave_index];
        let weights = wave
            .route_weights
            .as_deref()
            .unwrap_or(&map.route_weights);
        let scale = map.enemy_scale;

        self.spawn.clear();
        self.spawn.interval = wave.spawn_interval;
        let mut records = Vec::with_capacity(wave.unit_count() as usize);
        for group in &wave.composition {
            // Validated at construction time.
            let Some(template_index) = self.ruleset.enemy_index(&group.enemy) else {
                continue;
            };
            let template = &self.ruleset.enemies[template_index];
            for _ in 0..group.count {
                records.push(SpawnRecord {
                    hp: template.hp * scale.hp,
                    speed: template.speed * scale.speed,
                    coin_reward: (template.coin_reward as f64 * scale.rewards).round() as i64,
                    xp_reward: (template.xp_reward as f64 * scale.rewards).round() as i64,
                    route_index: pick_weighted(&mut self.rng, weights),
                });
            }
        }
        self.enemies.reserve(records.len());
        self.spawn.records = records;
    }

    fn update_spawns(&mut self, dt: f64) {
        if self.spawn.exhausted() {
            return;
        }
        self.spawn.timer -= dt;
        while self.spawn.timer <= 0.0 && !self.spawn.exhausted() {
            let record = self.spawn.records[self.spawn.cursor];
            let entry = self.routes[record.route_index].start();
            self.enemies.spawn(&record, entry);
            self.spawn.cursor += 1;
            self.stats.spawned += 1;
            self.spawn.timer += self.spawn.interval;
        }
    }

    fn refresh_positions(&mut self) {
        for index in 0..self.enemies.len() {
            let route = self.enemies.route[index];
            self.enemies.position[index] = self.routes[route].position_at(self.enemies.distance[index]);
        }
    }

    fn update_effects(&mut self, dt: f64) {
        combat::update_zones(&mut self.enemies, &mut self.zones, dt);
        combat::decay_statuses(&mut self.enemies, dt);
        let (killed, coins, xp) = combat::remove_dead(&mut self.enemies);
        self.stats.killed += killed;
        self.coins += coins;
        self.xp += xp;
    }

    fn update_attacks(&mut self, dt: f64) {
        let mut scratch = std::mem::take(&mut self.scratch);
        for index in 0..self.slots.len() {
            let Some(state) = self.slots[index].tower else {
                continue;
            };
            let mut cooldown = (state.cooldown - dt).max(0.0);
            if cooldown > 0.0 {
                if let Some(state) = self.slots[index].tower.as_mut() {
                    state.cooldown = cooldown;
                }
                continue;
            }

            let spec = &self.ruleset.towers[state.type_index];
            let archetype = spec.archetype;
            let stats: LevelStats = *spec.level(state.level);
            let origin = self.slots[index].config.position;

            let impact = match archetype {
                Archetype::AreaControl => {
                    let limit = stats.control_targets.max(1) as usize;
                    combat::top_targets(
                        &self.enemies,
                        &self.route_lengths,
                        origin,
                        stats.range,
                        limit,
                        &mut scratch,
                    );
                    if scratch.is_empty() {
                        None
                    } else {
                        let impact = self.enemies.position[scratch[0]];
                        combat::apply_area_control(&mut self.enemies, &scratch, &stats);
                        Some(impact)
                    }
                }
                _ => {
                    match combat::best_target(&self.enemies, &self.route_lengths, origin, stats.range)
                    {
                        None => None,
                        Some(target) => {
                            let impact = self.enemies.position[target];
                            match archetype {
                                Archetype::Splash => {
                                    combat::apply_splash(&mut self.enemies, target, &stats);
                                }
                                Archetype::Incendiary => {
                                    combat::apply_incendiary(
                                        &mut self.enemies,
                                        &mut self.zones,
                                        target,
                                        &stats,
                                    );
                                }
                                Archetype::Chain => {
                                    combat::apply_chain(&mut self.enemies, target, &stats);
                                }
                                _ => {
                                    self.enemies.hp[target] -= stats.damage;
                                }
                            }
                            Some(impact)
                        }
                    }
                }
            };

            if let Some(impact) = impact {
                cooldown = if stats.attack_speed > 0.0 {
                    1.0 / stats.attack_speed
                } else {
                    0.0
                };
                self.attacks.push(AttackEvent {
                    from: origin,
                    to: impact,
                    archetype,
                });
            }
            if let Some(state) = self.slots[index].tower.as_mut() {
                state.cooldown = cooldown;
            }
        }
        self.scratch = scratch;
    }

    fn update_movement(&mut self, dt: f64) {
        let penalty = self.map().leak_penalty;
        let mut index = 0;
        while index < self.enemies.len() {
            let speed = combat::effective_speed(
                self.enemies.speed[index],
                self.enemies.slow_percent[index],
            );
            self.enemies.distance[index] += speed * dt;
            if self.enemies.distance[index] >= self.route_lengths[self.enemies.route[index]] {
                self.enemies.swap_remove(index);
                self.stats.leaked += 1;
                self.coins -= penalty.coins;
                self.xp = (self.xp - penalty.xp).max(0);
            } else {
                index += 1;
            }
        }
        if self.coins < 0 {
            self.finish_defeat();
        }
    }

    fn resolve_wave_state(&mut self) {
        if self.phase == Phase::WaveRunning && self.spawn.exhausted() && self.enemies.is_empty() {
            self.finish_wave_cleared();
        }
    }

    fn finish_wave_cleared(&mut self) {
        let map = &self.maps.maps[self.map_index];
        let wave_bonus = self.ruleset.progression.xp_per_wave_clear + map.xp_wave_bonus;
        let last_wave = self.wave_index == Some(map.waves.len() - 1);
        let clear_reward = map.clear_reward;
        let map_bonus = self.ruleset.progression.xp_map_clear + map.xp_map_bonus;
        let map_id = map.id.clone();

        self.xp += wave_bonus;
        if last_wave {
            self.coins += clear_reward.coins;
            self.xp += clear_reward.xp + map_bonus;
            self.outcome = Some(MapOutcome {
                victory: true,
                map_id,
            });
            self.phase = Phase::MapResult;
        } else {
            self.phase = Phase::WaveResult;
        }
    }

    fn finish_defeat(&mut self) {
        self.outcome = Some(MapOutcome {
            victory: false,
            map_id: self.map().id.clone(),
        });
        self.phase = Phase::MapResult;
    }

    fn build_wave_payload(&self) -> WavePayload {
        let map = self.map();
        let towers = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot_index, slot)| {
                let state = slot.tower?;
                let spec = &self.ruleset.towers[state.type_index];
                Some(TowerRecord {
                    slot_index,
                    type_index: state.type_index,
                    position: slot.config.position,
                    cooldown: state.cooldown,
                    stats: *spec.level(state.level),
                })
            })
            .collect();

        WavePayload {
            coins: self.coins,
            xp: self.xp,
            leak_coins: map.leak_penalty.coins,
            leak_xp: map.leak_penalty.xp,
            dt: OFFLOAD_TICK_SECONDS * self.speed,
            spawn_interval: self.spawn.interval,
            routes: map
                .routes
                .iter()
                .map(|route| route.waypoints.clone())
                .collect(),
            spawn_queue: self.spawn.records[self.spawn.cursor..].to_vec(),
            towers,
            zones: self.zones.records(),
        }
    }

    fn run_offload(&mut self) {
        let payload = self.build_wave_payload();
        let result = self
            .offload
            .as_mut()
            .map(|client| client.simulate_wave(&payload));
        match result {
            Some(Ok(report)) => self.apply_report(report),
            Some(Err(err)) => {
                log::warn!("wave offload failed, falling back to local stepping: {err}");
                self.offload = None;
            }
            None => {}
        }
    }

    fn apply_report(&mut self, report: WaveReport) {
        self.stats.spawned += self.spawn.remaining() as u64;
        self.stats.killed += report.killed;
        self.stats.leaked += report.leaked;
        self.coins = report.coins;
        self.xp = report.xp;
        self.spawn.cursor = self.spawn.records.len();
        self.enemies.clear();
        self.zones.restore(&report.zones);
        for (slot_index, cooldown) in report.cooldowns {
            if let Some(slot) = self.slots.get_mut(slot_index) {
                if let Some(state) = slot.tower.as_mut() {
                    state.cooldown = cooldown;
                }
            }
        }
        if report.defeat {
            self.finish_defeat();
        } else {
            self.finish_wave_cleared();
        }
    }
}

fn validate_map(ruleset: &Ruleset, map: &MapConfig) -> Result<(), SetupError> {
    for route in &map.routes {
        if route.waypoints.len() < 2 {
            return Err(SetupError::DegenerateRoute {
                map: map.id.clone(),
                route: route.id.clone(),
            });
        }
    }
    if map.route_weights.len() != map.routes.len() {
        return Err(SetupError::WeightMismatch {
            map: map.id.clone(),
            weights: map.route_weights.len(),
            routes: map.routes.len(),
        });
    }
    for wave in &map.waves {
        if let Some(weights) = &wave.route_weights {
            if weights.len() != map.routes.len() {
                return Err(SetupError::WeightMismatch {
                    map: map.id.clone(),
                    weights: weights.len(),
                    routes: map.routes.len(),
                });
            }
        }
        for group in &wave.composition {
            if ruleset.enemy_index(&group.enemy).is_none() {
                return Err(SetupError::UnknownEnemy {
                    map: map.id.clone(),
                    enemy: group.enemy.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Samples an index from `weights` proportionally to each entry.
///
/// Non-positive totals fall back to the first index so a malformed weight
/// list degrades to deterministic assignment instead of a panic.
fn pick_weighted(rng: &mut ChaCha8Rng, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().filter(|w| w.is_finite()).sum();
    if total <= 0.0 || weights.is_empty() {
        return 0;
    }
    let mut roll = rng.gen::<f64>() * total;
    for (index, weight) in weights.iter().enumerate() {
        if !weight.is_finite() {
            continue;
        }
        roll -= weight;
        if roll < 0.0 {
            return index;
        }
    }
    weights.len() - 1
}

/// Read-side accessors over a [`Game`].
pub mod query {
    use super::*;

    /// Pollable summary of the scenario.
    #[must_use]
    pub fn snapshot(game: &Game) -> GameSnapshot {
        GameSnapshot {
            map_id: game.map().id.clone(),
            coins: game.coins,
            xp: game.xp,
            phase: game.phase,
            wave_index: game.wave_index,
            stats: game.stats,
            outcome: game.outcome.clone(),
            units_remaining: game.spawn.remaining() + game.enemies.len(),
        }
    }

    /// Every buildable slot with its activation and occupancy state.
    #[must_use]
    pub fn slots(game: &Game) -> Vec<SlotView> {
        game.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| SlotView {
                id: slot.config.id.clone(),
                position: slot.config.position,
                activation_cost: game.activation_cost(index),
                active: slot.active,
                occupied: slot.tower.is_some(),
            })
            .collect()
    }

    /// Identifiers of slots excluded by the route clearance corridor.
    #[must_use]
    pub fn blocked_slots(game: &Game) -> Vec<String> {
        game.blocked.iter().map(|slot| slot.id.clone()).collect()
    }

    /// Every defense unit currently standing.
    #[must_use]
    pub fn towers(game: &Game) -> Vec<TowerSnapshot> {
        game.slots
            .iter()
            .filter_map(|slot| {
                let state = slot.tower?;
                Some(TowerSnapshot {
                    slot_id: slot.config.id.clone(),
                    tower_id: game.ruleset.towers[state.type_index].id.clone(),
                    level: state.level,
                    position: slot.config.position,
                    cooldown: state.cooldown,
                })
            })
            .collect()
    }

    /// The defense unit on `slot_id`, if the slot exists and is occupied.
    #[must_use]
    pub fn tower_at(game: &Game, slot_id: &str) -> Option<TowerSnapshot> {
        towers(game)
            .into_iter()
            .find(|tower| tower.slot_id == slot_id)
    }

    /// Every live hostile unit, for presentation.
    #[must_use]
    pub fn units(game: &Game) -> Vec<UnitView> {
        (0..game.enemies.len())
            .map(|index| UnitView {
                position: game.enemies.position[index],
                hp: game.enemies.hp[index],
                route: game.enemies.route[index],
            })
            .collect()
    }

    /// Attacks applied during the most recent tick.
    #[must_use]
    pub fn attacks(game: &Game) -> &[AttackEvent] {
        &game.attacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riverguard_core::{
        EnemySpec, LeakPenalty, Progression, RouteConfig, SlotConfig, SpawnGroup, TowerSpec,
        WaveConfig,
    };

    fn tiny_ruleset() -> Ruleset {
        Ruleset {
            towers: vec![TowerSpec {
                id: "arrow".to_owned(),
                name: "Arrow".to_owned(),
                archetype: Archetype::Physical,
                levels: vec![
                    LevelStats {
                        cost: 100,
                        damage: 50.0,
                        range: 3.0,
                        attack_speed: 1.0,
                        ..LevelStats::default()
                    },
                    LevelStats {
                        cost: 150,
                        damage: 80.0,
                        range: 3.2,
                        attack_speed: 1.2,
                        ..LevelStats::default()
                    },
                ],
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

    fn tiny_map() -> MapConfig {
        MapConfig {
            id: "proving_grounds".to_owned(),
            name: "Proving Grounds".to_owned(),
            seed: 7,
            starting_coins: 500,
            starting_xp: 0,
            leak_penalty: LeakPenalty { coins: 50, xp: 1 },
            enemy_scale: Default::default(),
            xp_wave_bonus: 0,
            xp_map_bonus: 0,
            clear_reward: Default::default(),
            routes: vec![RouteConfig {
                id: "main".to_owned(),
                waypoints: vec![DVec2::new(0.0, 0.5), DVec2::new(1.0, 0.5)],
            }],
            route_weights: vec![1.0],
            slot_activation_cost: 25,
            slot_clearance_px: None,
            build_slots: vec![
                SlotConfig {
                    id: "near".to_owned(),
                    position: DVec2::new(0.5, 0.52),
                    activation_cost: None,
                },
                SlotConfig {
                    id: "far".to_owned(),
                    position: DVec2::new(0.5, 0.3),
                    activation_cost: Some(40),
                },
            ],
            waves: vec![WaveConfig {
                spawn_interval: 0.5,
                composition: vec![SpawnGroup {
                    enemy: "scout".to_owned(),
                    count: 2,
                }],
                route_weights: None,
            }],
        }
    }

    fn tiny_game() -> Game {
        let map = tiny_map();
        let maps = MapSet {
            default_map: map.id.clone(),
            maps: vec![map],
        };
        Game::new(tiny_ruleset(), maps).expect("valid campaign")
    }

    #[test]
    fn slots_inside_the_clearance_corridor_are_blocked() {
        let game = tiny_game();
        // 0.02 normalized height is 13.6 render pixels, just outside the
        // default 12 px corridor, while the far slot clears it easily.
        assert_eq!(query::slots(&game).len(), 2);
        assert!(query::blocked_slots(&game).is_empty());

        let mut map = tiny_map();
        map.build_slots[0].position = DVec2::new(0.5, 0.51);
        let maps = MapSet {
            default_map: map.id.clone(),
            maps: vec![map],
        };
        let game = Game::new(tiny_ruleset(), maps).expect("valid campaign");
        assert_eq!(query::blocked_slots(&game), vec!["near".to_owned()]);
    }

    #[test]
    fn building_requires_activation_and_charges_both_costs() {
        let mut game = tiny_game();
        assert_eq!(
            game.build_tower("far", "arrow"),
            Err(BuildError::SlotInactive("far".to_owned()))
        );
        let activation = game.activate_slot("far").expect("activation");
        assert_eq!(activation.slot, 40);
        let build = game.build_tower("far", "arrow").expect("build");
        assert_eq!(build.tower, 100);
        assert_eq!(query::snapshot(&game).coins, 500 - 40 - 100);
        assert_eq!(
            game.build_tower("far", "arrow"),
            Err(BuildError::SlotOccupied("far".to_owned()))
        );
    }

    #[test]
    fn upgrade_walks_the_level_table_and_stops_at_the_top() {
        let mut game = tiny_game();
        let _ = game.activate_slot("far").expect("activation");
        let _ = game.build_tower("far", "arrow").expect("build");
        let upgrade = game.upgrade_tower("far").expect("upgrade");
        assert_eq!(upgrade.tower, 150);
        assert_eq!(query::tower_at(&game, "far").expect("occupied").level, 2);
        assert_eq!(game.upgrade_tower("far"), Err(BuildError::MaxLevel));
    }

    #[test]
    fn selling_refunds_a_fraction_of_cumulative_spend() {
        let mut game = tiny_game();
        let _ = game.activate_slot("far").expect("activation");
        let _ = game.build_tower("far", "arrow").expect("build");
        let _ = game.upgrade_tower("far").expect("upgrade");
        let coins_before = query::snapshot(&game).coins;
        let refund = game.sell_tower("far").expect("sell");
        assert_eq!(refund, (100 + 150) * SELL_REFUND_PERCENT / 100);
        assert_eq!(query::snapshot(&game).coins, coins_before + refund);
        assert!(query::tower_at(&game, "far").is_none());
        // The slot remains active for rebuilding.
        let rebuilt = game.build_tower("far", "arrow");
        assert!(rebuilt.is_ok());
    }

    #[test]
    fn insufficient_funds_reject_without_mutating() {
        let mut game = tiny_game();
        game.coins = 10;
        let result = game.activate_slot("far");
        assert_eq!(
            result,
            Err(BuildError::InsufficientCoins {
                needed: 40,
                available: 10,
            })
        );
        assert_eq!(query::snapshot(&game).coins, 10);
    }

    #[test]
    fn weighted_pick_covers_every_index() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let weights = [0.5, 0.3, 0.2];
        let mut seen = [false; 3];
        for _ in 0..256 {
            seen[pick_weighted(&mut rng, &weights)] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn weighted_pick_degrades_on_malformed_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(pick_weighted(&mut rng, &[0.0, 0.0]), 0);
        assert_eq!(pick_weighted(&mut rng, &[]), 0);
    }

    #[test]
    fn validation_rejects_mismatched_weights() {
        let mut map = tiny_map();
        map.route_weights = vec![0.5, 0.5];
        let maps = MapSet {
            default_map: map.id.clone(),
            maps: vec![map],
        };
        assert!(matches!(
            Game::new(tiny_ruleset(), maps),
            Err(SetupError::WeightMismatch { .. })
        ));
    }
}
