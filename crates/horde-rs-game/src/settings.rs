//! Tunables for the spawning core, deserialized from the `[spawning]` config section.

use horde_rs_world::Aabb;
use serde::Deserialize;

use crate::affix_roller::{DEFAULT_AFFIX_CURVE, DEFAULT_DOUBLE_AFFIX_CURVE};

#[derive(Debug, Clone, Deserialize)]
pub struct SpawnSettings {
    /// Global cap on natural spawns per scheduler pass.
    #[serde(default = "default_max_spawns_per_tick")]
    pub max_spawns_per_tick: u32,
    /// Game ticks between scheduler passes (10 = 0.5 s).
    #[serde(default = "default_spawn_interval_ticks")]
    pub spawn_interval_ticks: u64,
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
    /// Cooldown multiplier applied at night.
    #[serde(default = "default_night_spawn_speedup_factor")]
    pub night_spawn_speedup_factor: f64,
    /// Mobs with no player inside this radius are despawned on cleanup.
    #[serde(default = "default_despawn_radius")]
    pub despawn_radius: f32,
    /// Random level offset in `[-level_jitter, level_jitter]`.
    #[serde(default = "default_level_jitter")]
    pub level_jitter: u32,
    /// One extra level per this many player levels.
    #[serde(default = "default_player_levels_per_bonus")]
    pub player_levels_per_bonus: u32,
    #[serde(default = "default_night_level_bonus")]
    pub night_level_bonus: u32,
    /// Affix chance indexed by zone id.
    #[serde(default = "default_affix_curve")]
    pub affix_curve: Vec<f64>,
    /// Chance of a second affix on an affixed mob, indexed by zone id.
    #[serde(default = "default_double_affix_curve")]
    pub double_affix_curve: Vec<f64>,
    /// Optional JSON file replacing the built-in affixes.
    #[serde(default)]
    pub affix_file: Option<String>,
    #[serde(default)]
    pub placement: PlacementSettings,
    #[serde(default)]
    pub crowding: CrowdingSettings,
    #[serde(default)]
    pub horde: HordeSettings,
    #[serde(default)]
    pub boss: BossSettings,
    #[serde(default)]
    pub mass_event: MassEventSettings,
    #[serde(default)]
    pub day_cycle: DayCycleSettings,
}

fn default_max_spawns_per_tick() -> u32 {
    20
}

fn default_spawn_interval_ticks() -> u64 {
    10
}

fn default_cleanup_interval_seconds() -> u64 {
    30
}

fn default_night_spawn_speedup_factor() -> f64 {
    0.7
}

fn default_despawn_radius() -> f32 {
    64.0
}

fn default_level_jitter() -> u32 {
    1
}

fn default_player_levels_per_bonus() -> u32 {
    10
}

fn default_night_level_bonus() -> u32 {
    1
}

fn default_affix_curve() -> Vec<f64> {
    DEFAULT_AFFIX_CURVE.to_vec()
}

fn default_double_affix_curve() -> Vec<f64> {
    DEFAULT_DOUBLE_AFFIX_CURVE.to_vec()
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            max_spawns_per_tick: default_max_spawns_per_tick(),
            spawn_interval_ticks: default_spawn_interval_ticks(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            night_spawn_speedup_factor: default_night_spawn_speedup_factor(),
            despawn_radius: default_despawn_radius(),
            level_jitter: default_level_jitter(),
            player_levels_per_bonus: default_player_levels_per_bonus(),
            night_level_bonus: default_night_level_bonus(),
            affix_curve: default_affix_curve(),
            double_affix_curve: default_double_affix_curve(),
            affix_file: None,
            placement: PlacementSettings::default(),
            crowding: CrowdingSettings::default(),
            horde: HordeSettings::default(),
            boss: BossSettings::default(),
            mass_event: MassEventSettings::default(),
            day_cycle: DayCycleSettings::default(),
        }
    }
}

/// Placement search rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    /// Random points tried per spawn before giving up.
    pub attempts: u32,
    /// Points closer than this to the player are rejected.
    pub min_player_distance: f32,
    /// Light levels above this are "bright".
    pub bright_light_threshold: u8,
    /// Probability a bright point is rejected.
    pub bright_rejection_chance: f64,
    /// Boxes where nothing spawns.
    pub protected_areas: Vec<Aabb>,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            attempts: 10,
            min_player_distance: 12.0,
            bright_light_threshold: 10,
            bright_rejection_chance: 0.7,
            protected_areas: Vec::new(),
        }
    }
}

/// Population limits beyond per-zone capacity, and idle-player handling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrowdingSettings {
    /// No natural spawns while this many mobs are tracked.
    pub hard_global_cap: usize,
    /// Tracked total that triggers an emergency trim.
    pub emergency_threshold: usize,
    /// Share of capacity each zone is trimmed to in an emergency.
    pub emergency_fill: f64,
    /// Mobs allowed within `player_check_radius` of an active player.
    pub max_mobs_per_player: usize,
    pub player_check_radius: f32,
    /// A player who moved less than `afk_movement_threshold` blocks for this
    /// long is idle.
    pub afk_threshold_seconds: u64,
    pub afk_movement_threshold: f32,
    /// Spawn interval multiplier for idle players.
    pub afk_interval_multiplier: f64,
    /// Mobs allowed around an idle player.
    pub afk_mob_limit: usize,
    /// Idle players with more than `afk_mob_limit + afk_excess_margin` mobs
    /// nearby get trimmed back to `afk_mob_limit`.
    pub afk_excess_margin: usize,
    pub overpopulation_check_seconds: u64,
}

impl Default for CrowdingSettings {
    fn default() -> Self {
        Self {
            hard_global_cap: 400,
            emergency_threshold: 350,
            emergency_fill: 0.7,
            max_mobs_per_player: 40,
            player_check_radius: 48.0,
            afk_threshold_seconds: 30,
            afk_movement_threshold: 2.0,
            afk_interval_multiplier: 3.0,
            afk_mob_limit: 15,
            afk_excess_margin: 10,
            overpopulation_check_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HordeSettings {
    pub batch_min: u32,
    pub batch_max: u32,
    pub batch_interval_seconds: u64,
    /// Wave `k` targets `wave_base + wave_step * k` mobs.
    pub wave_base: u32,
    pub wave_step: u32,
    pub max_waves: u32,
    pub inter_wave_delay_seconds: u64,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Consecutive batches that place nothing before the horde is abandoned.
    pub max_empty_batches: u32,
}

impl Default for HordeSettings {
    fn default() -> Self {
        Self {
            batch_min: 3,
            batch_max: 5,
            batch_interval_seconds: 2,
            wave_base: 10,
            wave_step: 5,
            max_waves: 5,
            inter_wave_delay_seconds: 10,
            min_radius: 15.0,
            max_radius: 25.0,
            max_empty_batches: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BossSettings {
    pub cooldown_minutes: u64,
}

impl Default for BossSettings {
    fn default() -> Self {
        Self {
            cooldown_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MassEventSettings {
    pub default_factor: f64,
    pub default_duration_seconds: u64,
}

impl Default for MassEventSettings {
    fn default() -> Self {
        Self {
            default_factor: 3.0,
            default_duration_seconds: 600,
        }
    }
}

/// World clock. Night is `night_start..=night_end` within each day.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DayCycleSettings {
    pub day_length_ticks: u64,
    pub night_start: u64,
    pub night_end: u64,
    /// Time of day at startup.
    pub start_time: u64,
}

impl Default for DayCycleSettings {
    fn default() -> Self {
        Self {
            day_length_ticks: 24_000,
            night_start: 13_000,
            night_end: 23_000,
            start_time: 0,
        }
    }
}
