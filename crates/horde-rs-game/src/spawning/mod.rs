//! Spawning: steady-state per-player spawns, hordes, and the shared spawn primitive.

pub mod horde;
pub mod placement;
pub mod scheduler;

use horde_rs_world::{BlockAccess, Vec3};
use rand::Rng;

use crate::affix_roller::AffixRoller;
use crate::error::EntityError;
use crate::hooks::{BehaviorHook, EntityLifecycle, SpawnAttributes};
use crate::mob_registry::{MobKind, MobRegistry};
use crate::population::{ActiveMob, PopulationTracker};
use crate::selector::WeightedTypeSelector;
use crate::zone::{ZoneId, ZoneTable};

/// Player identity as seen by the spawner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u64);

/// Per-tick view of a connected player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub position: Vec3,
    pub level: u32,
}

/// Everything a spawn needs for one tick: read-only tables, the population
/// tracker, and the entity-layer collaborators.
pub struct SpawnContext<'a, W, E, B> {
    pub world: &'a W,
    pub entities: &'a mut E,
    pub behavior: &'a mut B,
    pub zones: &'a ZoneTable,
    pub mobs: &'a MobRegistry,
    pub selector: &'a WeightedTypeSelector,
    pub affixes: &'a AffixRoller,
    pub population: &'a PopulationTracker,
    pub now_ms: u64,
    pub night: bool,
}

impl<W, E, B> SpawnContext<'_, W, E, B>
where
    W: BlockAccess,
    E: EntityLifecycle,
    B: BehaviorHook,
{
    /// Spawn and register one mob at a resolved position.
    ///
    /// Rolls affixes, creates the entity, attaches behavior once, and
    /// registers the mob under `zone`. Capacity is not checked here.
    pub fn spawn_mob(
        &mut self,
        zone: ZoneId,
        kind: MobKind,
        position: Vec3,
        level: u32,
        rng: &mut (impl Rng + ?Sized),
    ) -> Result<ActiveMob, EntityError> {
        let def = self.mobs.get(kind).ok_or(EntityError::UnknownKind(kind))?;
        let affixes = self.affixes.roll(zone, def, rng);
        let attributes = SpawnAttributes::from_definition(def, level).with_affixes(&affixes);

        let entity = self.entities.spawn_entity(kind, position, &attributes)?;
        self.behavior.attach_behavior(entity, kind, level);

        let mob = ActiveMob {
            id: self.population.allocate_id(),
            entity,
            kind,
            level,
            zone,
            spawned_at_ms: self.now_ms,
            position,
            affixes,
            boss: def.is_boss(),
        };
        self.population.register(mob.clone());
        Ok(mob)
    }

    /// Zone containing `position`.
    pub fn zone_at(&self, position: Vec3) -> ZoneId {
        self.zones.zone_id_at(position.z.floor() as i32)
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use super::*;
    use crate::affix::AffixRegistry;
    use crate::hooks::BehaviorQueue;
    use crate::test_support::MockEntities;
    use crate::zone::ZoneOverride;
    use horde_rs_world::flat_generator::FlatLayers;
    use horde_rs_world::level::SKY_LIGHT_NIGHT;
    use horde_rs_world::Level;

    /// Zones are 100 blocks deep: zone 1 spans z = 100..=199.
    pub struct Fixture {
        pub level: Level,
        pub entities: MockEntities,
        pub behavior: BehaviorQueue,
        pub zones: ZoneTable,
        pub mobs: MobRegistry,
        pub selector: WeightedTypeSelector,
        pub affixes: AffixRoller,
        pub population: PopulationTracker,
    }

    impl Fixture {
        pub fn new(overrides: &[ZoneOverride]) -> Self {
            let mut zones = ZoneTable::generated(12, 100);
            zones.apply_overrides(overrides).unwrap();
            let mobs = MobRegistry::new();
            let selector = WeightedTypeSelector::build(&mobs, &zones);
            let population = PopulationTracker::with_zones(&zones);
            let mut level = Level::flat(FlatLayers::default());
            level.set_sky_light(SKY_LIGHT_NIGHT);
            Self {
                level,
                entities: MockEntities::new(),
                behavior: BehaviorQueue::new(),
                zones,
                mobs,
                selector,
                affixes: AffixRoller::new(AffixRegistry::new()),
                population,
            }
        }

        pub fn ctx(
            &mut self,
            now_ms: u64,
            night: bool,
        ) -> SpawnContext<'_, Level, MockEntities, BehaviorQueue> {
            SpawnContext {
                world: &self.level,
                entities: &mut self.entities,
                behavior: &mut self.behavior,
                zones: &self.zones,
                mobs: &self.mobs,
                selector: &self.selector,
                affixes: &self.affixes,
                population: &self.population,
                now_ms,
                night,
            }
        }

        /// Register `count` mobs in `zone` without entities behind them.
        pub fn fill_zone(&mut self, zone: ZoneId, count: usize) {
            for _ in 0..count {
                let pos = Vec3::new(0.5, 4.0, 150.5);
                let handle = self.entities.insert_entity(pos);
                self.population.register(ActiveMob {
                    id: self.population.allocate_id(),
                    entity: handle,
                    kind: MobKind::Walker,
                    level: 1,
                    zone,
                    spawned_at_ms: 0,
                    position: pos,
                    affixes: Vec::new(),
                    boss: false,
                });
            }
        }
    }

    pub fn player(id: u64, x: f32, z: f32) -> PlayerSnapshot {
        PlayerSnapshot {
            id: PlayerId(id),
            position: Vec3::new(x, 4.0, z),
            level: 1,
        }
    }
}
