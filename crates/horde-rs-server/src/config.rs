use horde_rs_game::settings::SpawnSettings;
use horde_rs_game::zone::ZoneOverride;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub spawning: SpawnSettings,
    #[serde(default)]
    pub demo: DemoSection,
    /// Per-zone overrides applied on top of the generated zone table.
    #[serde(default)]
    pub zones: Vec<ZoneOverride>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    pub name: String,
    /// Live mob limit enforced by the entity layer.
    #[serde(default = "default_entity_limit")]
    pub entity_limit: usize,
    /// Population report interval in seconds. 0 = disabled.
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,
}

fn default_entity_limit() -> usize {
    5000
}

fn default_stats_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    /// Seed for every spawn decision. Random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_zone_count")]
    pub zone_count: u32,
    /// Blocks per zone along +Z.
    #[serde(default = "default_zone_depth")]
    pub zone_depth: i32,
    /// Light-emitting blocks placed at startup.
    #[serde(default)]
    pub lights: Vec<LightSource>,
}

fn default_zone_count() -> u32 {
    50
}

fn default_zone_depth() -> i32 {
    200
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            seed: None,
            zone_count: default_zone_count(),
            zone_depth: default_zone_depth(),
            lights: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightSource {
    pub block: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Simulated players walking the world.
#[derive(Debug, Deserialize)]
pub struct DemoSection {
    #[serde(default)]
    pub players: u32,
    #[serde(default = "default_player_level")]
    pub player_level: u32,
    /// Blocks per tick.
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f32,
    #[serde(default = "default_attack_damage")]
    pub attack_damage: f32,
    #[serde(default = "default_attack_interval_ticks")]
    pub attack_interval_ticks: u64,
}

fn default_player_level() -> u32 {
    1
}

fn default_walk_speed() -> f32 {
    0.2
}

fn default_attack_damage() -> f32 {
    6.0
}

fn default_attack_interval_ticks() -> u64 {
    20
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            players: 0,
            player_level: default_player_level(),
            walk_speed: default_walk_speed(),
            attack_damage: default_attack_damage(),
            attack_interval_ticks: default_attack_interval_ticks(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}
