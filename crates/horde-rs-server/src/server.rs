//! Server state: the world, the entity layer, and the spawn director, advanced
//! together once per tick.

use std::error::Error;
use std::path::{Path, PathBuf};

use horde_rs_game::affix::AffixRegistry;
use horde_rs_game::director::{GameEvent, SpawnDirector};
use horde_rs_game::ecs::EcsEntities;
use horde_rs_game::hooks::BehaviorQueue;
use horde_rs_game::zone::ZoneTable;
use horde_rs_world::flat_generator::FlatLayers;
use horde_rs_world::level::{SKY_LIGHT_DAY, SKY_LIGHT_NIGHT};
use horde_rs_world::{Block, Level};
use tracing::{debug, info, warn};

use crate::config::{ServerConfig, WorldSection};
use crate::demo::DemoPlayers;

pub struct ServerState {
    pub config_path: PathBuf,
    pub director: SpawnDirector,
    pub level: Level,
    pub entities: EcsEntities,
    pub behavior: BehaviorQueue,
    pub demo: DemoPlayers,
}

/// Generated zone table with the config's overrides applied.
pub fn build_zones(config: &ServerConfig) -> Result<ZoneTable, Box<dyn Error>> {
    let mut zones = ZoneTable::generated(config.world.zone_count, config.world.zone_depth);
    zones.apply_overrides(&config.zones)?;
    Ok(zones)
}

/// Built-in affixes, or the configured affix file.
pub fn load_affixes(config: &ServerConfig) -> Result<AffixRegistry, Box<dyn Error>> {
    match &config.spawning.affix_file {
        Some(path) => {
            let registry = AffixRegistry::load(path)?;
            info!("Loaded {} affixes from {path}", registry.len());
            Ok(registry)
        }
        None => Ok(AffixRegistry::new()),
    }
}

fn build_level(world: &WorldSection) -> Level {
    let mut level = Level::flat(FlatLayers::default());
    for light in &world.lights {
        match Block::from_name(&light.block) {
            Some(block) => level.set_block(light.x, light.y, light.z, block),
            None => warn!("Unknown light block '{}', skipping", light.block),
        }
    }
    level
}

impl ServerState {
    pub fn new(config: &ServerConfig, config_path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let zones = build_zones(config)?;
        let affixes = load_affixes(config)?;
        let seed = config.world.seed;
        let director = SpawnDirector::new(config.spawning.clone(), zones, affixes, seed);

        let level = build_level(&config.world);
        let mut entities = EcsEntities::new(config.server.entity_limit);
        let demo = DemoPlayers::spawn(
            &config.demo,
            config.world.zone_count,
            config.world.zone_depth,
            level.surface_y() as f32,
            seed.unwrap_or_else(rand::random),
            &mut entities,
        );

        Ok(Self {
            config_path: config_path.as_ref().to_path_buf(),
            director,
            level,
            entities,
            behavior: BehaviorQueue::new(),
            demo,
        })
    }

    /// Advance the whole server by one 50 ms tick.
    pub fn game_tick(&mut self) {
        for handle in self.entities.cleanup_dead() {
            if let Some(mob) = self.director.on_mob_death(handle) {
                debug!(
                    "{:?} (level {}) died in zone {}, reward x{:.2}",
                    mob.kind,
                    mob.level,
                    mob.zone,
                    mob.reward_multiplier()
                );
            }
        }

        let tick = self.director.current_tick();
        self.demo.step(&mut self.entities, tick);

        let players = self.entities.players();
        self.director
            .tick(&self.level, &mut self.entities, &mut self.behavior, &players);
        self.entities.apply_behaviors(self.behavior.drain());
        self.entities.step_mobs();

        let sky = if self.director.is_night() {
            SKY_LIGHT_NIGHT
        } else {
            SKY_LIGHT_DAY
        };
        if self.level.sky_light() != sky {
            info!("{}", if sky == SKY_LIGHT_NIGHT { "Night falls" } else { "Day breaks" });
            self.level.set_sky_light(sky);
        }

        for event in self.director.drain_events() {
            log_event(&event);
        }
    }

    /// Re-read the config file and swap in its zones and affixes.
    pub fn reload(&mut self) -> Result<usize, Box<dyn Error>> {
        let config = ServerConfig::load(&self.config_path)?;
        let zones = build_zones(&config)?;
        let affixes = load_affixes(&config)?;
        let count = zones.len();
        self.director.reload_zones(zones);
        self.director.reload_affixes(affixes);
        Ok(count)
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::MobSpawned {
            kind,
            zone,
            level,
            affixes,
            ..
        } => debug!("Spawned {kind:?} lvl {level} in zone {zone} (affixes: {affixes:?})"),
        GameEvent::MobRemoved {
            kind, zone, reason, ..
        } => debug!("Removed {kind:?} from zone {zone}: {reason:?}"),
        GameEvent::HordeWaveStarted { zone, wave, target } => {
            info!("Horde wave {wave} in zone {zone}: {target} mobs")
        }
        GameEvent::HordeEnded(outcome) => info!(
            "Horde in zone {} {} ({} mobs, {} waves)",
            outcome.zone,
            if outcome.success { "repelled" } else { "ended early" },
            outcome.placed,
            outcome.waves
        ),
        GameEvent::MassEventStarted {
            factor,
            duration_ticks,
        } => info!("Blood moon rises: spawns x{factor} for {duration_ticks} ticks"),
        GameEvent::MassEventEnded => info!("Blood moon sets"),
        GameEvent::BossSpawned {
            kind, zone, level, ..
        } => info!("Boss {kind:?} (level {level}) appeared in zone {zone}"),
    }
}
