#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Riverguard engine.
//!
//! This crate defines the configuration surface consumed by the engine (maps,
//! tower level tables, enemy templates), the structured results returned by
//! every public operation, the snapshot types adapters poll, and the offload
//! seam through which an entire wave can be delegated to an external
//! accelerated process. The authoritative simulation lives in
//! `riverguard-world`; static campaign data lives in `riverguard-campaign`.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scale factor converting normalized map coordinates into world units.
///
/// Route waypoints and slot positions are expressed in `[0, 1]²` map space;
/// distances that feed combat (ranges, radii, travel) are measured in world
/// units obtained by multiplying normalized deltas by this factor.
pub const WORLD_SCALE: f64 = 10.0;

/// Width of the presentation surface, used for slot clearance checks.
pub const MAP_RENDER_WIDTH: f64 = 1100.0;

/// Height of the presentation surface, used for slot clearance checks.
pub const MAP_RENDER_HEIGHT: f64 = 680.0;

/// Default minimum distance (render pixels) between a build slot and a route.
pub const DEFAULT_SLOT_CLEARANCE_PX: f64 = 12.0;

/// Maximum distance (world units) a chain attack may arc between units.
pub const CHAIN_RADIUS: f64 = 2.6;

/// Attack behavior attached to a tower type.
///
/// The archetype set is closed; configuration that names an archetype outside
/// this enum is rejected at the serde boundary rather than at tick time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Direct damage to a single target.
    Physical,
    /// Direct damage plus reduced damage to units near the primary target.
    Splash,
    /// Direct damage plus a burn status and a lingering ground zone.
    Incendiary,
    /// Damage and a slow status applied to several targets at once.
    AreaControl,
    /// Damage that arcs from the primary target to nearby units.
    Chain,
}

/// Per-level combat parameters for one tower type.
///
/// Fields that do not apply to an archetype stay at zero; the resolver treats
/// zero as "absent", mirroring how the configuration tables omit them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelStats {
    /// Coins charged to reach this level (build cost at level 1).
    pub cost: i64,
    /// Direct damage per attack.
    pub damage: f64,
    /// Targeting range in world units.
    pub range: f64,
    /// Attacks per second; the post-attack cooldown is its reciprocal.
    pub attack_speed: f64,
    /// Radius of secondary splash damage around the primary target.
    pub splash_radius: f64,
    /// Percentage removed from splash damage relative to direct damage.
    pub splash_falloff: f64,
    /// Damage per second applied by the burn status.
    pub burn_dps: f64,
    /// Seconds the burn status persists.
    pub burn_duration: f64,
    /// Radius of the lingering ground zone left by incendiary attacks.
    pub zone_radius: f64,
    /// Damage per second dealt inside the ground zone.
    pub zone_dps: f64,
    /// Seconds the ground zone persists.
    pub zone_duration: f64,
    /// Percentage by which affected units are slowed.
    pub slow_percent: f64,
    /// Seconds the slow status persists.
    pub slow_duration: f64,
    /// Number of simultaneous targets for area-control attacks.
    pub control_targets: u32,
    /// Number of secondary targets a chain attack may arc to.
    pub chain_count: u32,
    /// Percentage removed from chained damage relative to direct damage.
    pub chain_falloff: f64,
    /// Seconds the shock marker persists on chained units.
    pub shock_duration: f64,
}

/// Static description of one tower type, including its full level table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerSpec {
    /// Stable identifier used by build operations and loadout transfer.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Attack behavior shared by every level of this tower.
    pub archetype: Archetype,
    /// Per-level parameters, indexed by `level - 1`.
    pub levels: Vec<LevelStats>,
}

impl TowerSpec {
    /// Parameters for the provided 1-based level, clamped to the table.
    #[must_use]
    pub fn level(&self, level: u32) -> &LevelStats {
        let index = (level.max(1) as usize - 1).min(self.levels.len().saturating_sub(1));
        &self.levels[index]
    }

    /// Highest level this tower can reach.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.levels.len() as u32
    }
}

/// Base statistics for one hostile unit type before map scaling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySpec {
    /// Stable identifier referenced by wave compositions.
    pub id: String,
    /// Hit points before per-map scaling.
    pub hp: f64,
    /// Travel speed in world units per second before per-map scaling.
    pub speed: f64,
    /// Coins granted when the unit is destroyed.
    pub coin_reward: i64,
    /// Experience granted when the unit is destroyed.
    pub xp_reward: i64,
}

/// Experience bonuses granted outside of per-unit rewards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    /// Experience granted when any wave is cleared.
    pub xp_per_wave_clear: i64,
    /// Experience granted when a map's final wave is cleared.
    pub xp_map_clear: i64,
}

/// Tower table, enemy templates, and progression constants for a campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    /// All tower types available for construction, in wire-index order.
    pub towers: Vec<TowerSpec>,
    /// All hostile unit templates, in wire-index order.
    pub enemies: Vec<EnemySpec>,
    /// Experience bonus configuration.
    pub progression: Progression,
}

impl Ruleset {
    /// Resolves a tower id to its index in the tower table.
    #[must_use]
    pub fn tower_index(&self, id: &str) -> Option<usize> {
        self.towers.iter().position(|tower| tower.id == id)
    }

    /// Resolves an enemy id to its index in the template table.
    #[must_use]
    pub fn enemy_index(&self, id: &str) -> Option<usize> {
        self.enemies.iter().position(|enemy| enemy.id == id)
    }
}

/// One route hostile units travel, as an ordered waypoint polyline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Stable identifier for presentation and diagnostics.
    pub id: String,
    /// Ordered waypoints in normalized `[0, 1]²` map space.
    pub waypoints: Vec<DVec2>,
}

/// A fixed build location that may hold at most one tower once activated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Stable identifier used by build operations.
    pub id: String,
    /// Position in normalized map space.
    pub position: DVec2,
    /// Activation cost override; the map default applies when absent.
    #[serde(default)]
    pub activation_cost: Option<i64>,
}

/// Number of units of one enemy type contributed to a wave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnGroup {
    /// Enemy template identifier.
    pub enemy: String,
    /// Number of units of this type spawned during the wave.
    pub count: u32,
}

/// One discrete batch of hostile units with a defined spawn cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Seconds between consecutive spawns.
    pub spawn_interval: f64,
    /// Composition expanded in declaration order into the spawn queue.
    pub composition: Vec<SpawnGroup>,
    /// Route weighting override; the map default applies when absent.
    #[serde(default)]
    pub route_weights: Option<Vec<f64>>,
}

impl WaveConfig {
    /// Total number of units this wave will spawn.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.composition.iter().map(|group| group.count).sum()
    }
}

/// Coins and experience deducted when a hostile unit leaks off its route.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakPenalty {
    /// Coins charged per leaked unit; may drive coins negative.
    pub coins: i64,
    /// Experience deducted per leaked unit, floored at zero.
    pub xp: i64,
}

/// Multipliers applied to enemy templates on a particular map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyScale {
    /// Hit point multiplier.
    pub hp: f64,
    /// Speed multiplier.
    pub speed: f64,
    /// Reward multiplier applied to both coins and experience.
    pub rewards: f64,
}

impl Default for EnemyScale {
    fn default() -> Self {
        Self {
            hp: 1.0,
            speed: 1.0,
            rewards: 1.0,
        }
    }
}

/// Currency and experience granted when a map's final wave is cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReward {
    /// Coins granted on map clear.
    pub coins: i64,
    /// Experience granted on map clear.
    pub xp: i64,
}

/// Complete static description of one scenario map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Stable map identifier.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Seed for the deterministic route-assignment stream.
    pub seed: u64,
    /// Coins available when the scenario starts fresh.
    pub starting_coins: i64,
    /// Experience available when the scenario starts fresh.
    pub starting_xp: i64,
    /// Penalty charged per leaked unit.
    pub leak_penalty: LeakPenalty,
    /// Per-map enemy template scaling.
    #[serde(default)]
    pub enemy_scale: EnemyScale,
    /// Extra experience granted per cleared wave on this map.
    #[serde(default)]
    pub xp_wave_bonus: i64,
    /// Extra experience granted when this map is cleared.
    #[serde(default)]
    pub xp_map_bonus: i64,
    /// Currency and experience granted when the final wave is cleared.
    #[serde(default)]
    pub clear_reward: ClearReward,
    /// Routes hostile units may be assigned to.
    pub routes: Vec<RouteConfig>,
    /// Default weighting across routes for spawn assignment.
    pub route_weights: Vec<f64>,
    /// Activation cost applied to slots without an explicit override.
    #[serde(default)]
    pub slot_activation_cost: i64,
    /// Clearance override in render pixels; the engine default applies
    /// when absent.
    #[serde(default)]
    pub slot_clearance_px: Option<f64>,
    /// All build slots, prior to the buildable/blocked partition.
    pub build_slots: Vec<SlotConfig>,
    /// Wave sequence played in order.
    pub waves: Vec<WaveConfig>,
}

impl MapConfig {
    /// Total number of hostile units across every wave of the map.
    #[must_use]
    pub fn fleet_size(&self) -> u32 {
        self.waves.iter().map(WaveConfig::unit_count).sum()
    }
}

/// Ordered collection of maps making up a campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapSet {
    /// Maps in campaign order.
    pub maps: Vec<MapConfig>,
    /// Identifier of the map selected when none is requested.
    pub default_map: String,
}

impl MapSet {
    /// Finds the position of a map by id.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.maps.iter().position(|map| map.id == id)
    }
}

/// Scenario lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Towers may be built while no wave is running; the initial state.
    BuildPhase,
    /// A wave is actively being simulated.
    WaveRunning,
    /// A wave finished; the next one may be started.
    WaveResult,
    /// Terminal state carrying the scenario outcome.
    MapResult,
}

/// Terminal outcome of a scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapOutcome {
    /// True when every wave was cleared without going bankrupt.
    pub victory: bool,
    /// Map the outcome applies to.
    pub map_id: String,
}

/// Running spawn/kill/leak counters for the active scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStats {
    /// Units emitted from spawn queues so far.
    pub spawned: u64,
    /// Units destroyed by tower or zone damage.
    pub killed: u64,
    /// Units that reached the end of their route alive.
    pub leaked: u64,
}

/// Pollable summary of the whole scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Identifier of the loaded map.
    pub map_id: String,
    /// Current coin balance.
    pub coins: i64,
    /// Current experience total.
    pub xp: i64,
    /// Current lifecycle state.
    pub phase: Phase,
    /// Zero-based index of the most recently started wave, if any.
    pub wave_index: Option<usize>,
    /// Cumulative spawn/kill/leak counters.
    pub stats: ScenarioStats,
    /// Terminal outcome once `phase` is [`Phase::MapResult`].
    pub outcome: Option<MapOutcome>,
    /// Units still queued or alive for the active wave.
    pub units_remaining: usize,
}

/// Read-only description of a tower occupying a slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerSnapshot {
    /// Slot the tower stands on.
    pub slot_id: String,
    /// Tower type identifier.
    pub tower_id: String,
    /// Current level, starting at 1.
    pub level: u32,
    /// Position in normalized map space.
    pub position: DVec2,
    /// Seconds until the tower may attack again.
    pub cooldown: f64,
}

/// One attack applied during the most recent tick, for presentation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackEvent {
    /// Position of the attacking tower in normalized map space.
    pub from: DVec2,
    /// Impact position in normalized map space.
    pub to: DVec2,
    /// Archetype of the attack, which selects the visual effect.
    pub archetype: Archetype,
}

/// Coins charged by a successful build operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Portion spent on the tower itself.
    pub tower: i64,
    /// Portion spent on slot activation, zero when already active.
    pub slot: i64,
    /// Total deducted from the balance.
    pub total: i64,
}

/// Expected rejections for build-phase operations.
///
/// These are returned as values and never mutate state; callers may retry
/// after a valid transition.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    /// The operation is not permitted in the current lifecycle state.
    #[error("operation not permitted in the current phase")]
    InvalidPhase,
    /// No buildable slot carries the provided identifier.
    #[error("unknown slot `{0}`")]
    UnknownSlot(String),
    /// No tower type carries the provided identifier.
    #[error("unknown tower type `{0}`")]
    UnknownTower(String),
    /// The slot already holds a tower.
    #[error("slot `{0}` is already occupied")]
    SlotOccupied(String),
    /// The slot must be activated before a tower can be built on it.
    #[error("slot `{0}` has not been activated")]
    SlotInactive(String),
    /// The slot was already activated.
    #[error("slot `{0}` is already activated")]
    AlreadyActivated(String),
    /// The slot holds no tower to upgrade or sell.
    #[error("slot `{0}` holds no tower")]
    SlotEmpty(String),
    /// The tower cannot be upgraded past its final configured level.
    #[error("tower is already at max level")]
    MaxLevel,
    /// The balance cannot cover the operation.
    #[error("insufficient coins: need {needed}, have {available}")]
    InsufficientCoins {
        /// Coins the operation would cost.
        needed: i64,
        /// Coins currently available.
        available: i64,
    },
}

/// Expected rejections for wave lifecycle operations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum WaveError {
    /// Waves may only start from the build phase or a wave result.
    #[error("cannot start a wave in the current phase")]
    InvalidPhase,
    /// Every configured wave has already been played.
    #[error("no waves remaining")]
    NoWavesRemaining,
}

/// Fully resolved description of one unit awaiting spawn, for offload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRecord {
    /// Hit points after map scaling.
    pub hp: f64,
    /// Speed after map scaling.
    pub speed: f64,
    /// Coin reward after map scaling.
    pub coin_reward: i64,
    /// Experience reward after map scaling.
    pub xp_reward: i64,
    /// Route the unit will travel.
    pub route_index: usize,
}

/// Attack parameters for one occupied slot, flattened for the wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerRecord {
    /// Index of the slot in buildable order.
    pub slot_index: usize,
    /// Index of the tower type in the ruleset table.
    pub type_index: usize,
    /// Tower position in normalized map space.
    pub position: DVec2,
    /// Remaining attack cooldown in seconds.
    pub cooldown: f64,
    /// Level-derived combat parameters.
    pub stats: LevelStats,
}

/// One lingering ground zone, as carried across the offload boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ZoneRecord {
    /// Zone center in normalized map space.
    pub center: DVec2,
    /// Zone radius in world units.
    pub radius: f64,
    /// Damage per second inside the radius.
    pub dps: f64,
    /// Seconds remaining before the zone expires.
    pub duration: f64,
}

/// Everything an external process needs to simulate a wave to completion.
#[derive(Clone, Debug, PartialEq)]
pub struct WavePayload {
    /// Coin balance entering the wave.
    pub coins: i64,
    /// Experience entering the wave.
    pub xp: i64,
    /// Coins charged per leak.
    pub leak_coins: i64,
    /// Experience deducted per leak.
    pub leak_xp: i64,
    /// Fixed per-tick delta, already scaled by the speed multiplier.
    pub dt: f64,
    /// Seconds between consecutive spawns.
    pub spawn_interval: f64,
    /// Waypoint polylines for every route.
    pub routes: Vec<Vec<DVec2>>,
    /// Expanded spawn sequence with resolved stats and route assignment.
    pub spawn_queue: Vec<SpawnRecord>,
    /// Attack parameters for every occupied slot.
    pub towers: Vec<TowerRecord>,
    /// Ground zones still active from earlier waves.
    pub zones: Vec<ZoneRecord>,
}

/// Post-wave state returned by an offload exchange.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaveReport {
    /// Coin balance after the wave.
    pub coins: i64,
    /// Experience after the wave.
    pub xp: i64,
    /// Units that leaked during the wave.
    pub leaked: u64,
    /// Units destroyed during the wave.
    pub killed: u64,
    /// True when the balance went negative during the wave.
    pub defeat: bool,
    /// Updated cooldowns as `(slot index, seconds)` pairs.
    pub cooldowns: Vec<(usize, f64)>,
    /// Ground zones still active after the wave.
    pub zones: Vec<ZoneRecord>,
}

/// Failures raised by the offload transport or codec.
///
/// The engine treats every variant identically: it disables offload for the
/// remainder of the scenario and falls back to local per-tick simulation.
#[derive(Debug, Error)]
pub enum OffloadError {
    /// The external executable does not exist at the configured path.
    #[error("offload binary not found at {0}")]
    MissingBinary(std::path::PathBuf),
    /// Spawning or exchanging bytes with the process failed.
    #[error("offload transport failure: {0}")]
    Transport(#[from] std::io::Error),
    /// The external process closed its output mid-exchange.
    #[error("offload process closed its output stream")]
    StreamClosed,
    /// The response line could not be parsed.
    #[error("malformed offload response: {0}")]
    MalformedResponse(String),
}

/// Seam through which an entire wave's computation can be delegated.
///
/// Implementations receive copies of state and return copies of updates; they
/// never touch engine pools directly. Any error permanently reverts the
/// scenario to local simulation.
pub trait WaveOffload: fmt::Debug {
    /// Simulates the wave described by `payload` to completion.
    fn simulate_wave(&mut self, payload: &WavePayload) -> Result<WaveReport, OffloadError>;
}
