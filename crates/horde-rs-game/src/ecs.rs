//! bevy_ecs-backed entity layer driven by the spawner.

use std::collections::BTreeMap;

use bevy_ecs::prelude::*;
use horde_rs_world::Vec3;

use crate::components::*;
use crate::error::EntityError;
use crate::hooks::{BehaviorRequest, EntityHandle, EntityLifecycle, SpawnAttributes};
use crate::mob_registry::MobKind;
use crate::spawning::{PlayerId, PlayerSnapshot};

/// Result of a melee hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strike {
    Hurt { remaining: f32 },
    Killed,
}

/// The ECS world holding players and mobs.
pub struct EcsEntities {
    pub world: World,
    players: BTreeMap<PlayerId, Entity>,
    /// Live mob limit; spawns beyond it are refused.
    entity_limit: usize,
}

impl EcsEntities {
    pub fn new(entity_limit: usize) -> Self {
        Self {
            world: World::new(),
            players: BTreeMap::new(),
            entity_limit,
        }
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    pub fn spawn_player(&mut self, id: PlayerId, position: Vec3, level: u32) {
        if let Some(old) = self.players.remove(&id) {
            self.world.despawn(old);
        }
        let entity = self
            .world
            .spawn((
                Position::from(position),
                Health {
                    current: 20.0,
                    max: 20.0,
                },
                Player { id, level },
            ))
            .id();
        self.players.insert(id, entity);
    }

    pub fn move_player(&mut self, id: PlayerId, position: Vec3) {
        let Some(&entity) = self.players.get(&id) else {
            return;
        };
        if let Some(mut pos) = self.world.get_mut::<Position>(entity) {
            *pos = Position::from(position);
        }
    }

    pub fn despawn_player(&mut self, id: PlayerId) {
        if let Some(entity) = self.players.remove(&id) {
            self.world.despawn(entity);
        }
    }

    /// Snapshot of every connected player, ordered by id.
    pub fn players(&self) -> Vec<PlayerSnapshot> {
        self.players
            .values()
            .filter_map(|&entity| {
                let pos = self.world.get::<Position>(entity)?;
                let player = self.world.get::<Player>(entity)?;
                Some(PlayerSnapshot {
                    id: player.id,
                    position: Vec3::from(*pos),
                    level: player.level,
                })
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Mobs
    // -----------------------------------------------------------------------

    /// Attach queued behaviors. Requests for entities that died meanwhile are dropped.
    pub fn apply_behaviors(&mut self, requests: impl IntoIterator<Item = BehaviorRequest>) {
        for req in requests {
            let Some(entity) = self.live_mob(req.handle) else {
                continue;
            };
            self.world.entity_mut(entity).insert(Brain::for_level(req.level));
        }
    }

    /// Hit a mob. Returns `None` when it is gone or already dead.
    pub fn strike(&mut self, handle: EntityHandle, damage: f32) -> Option<Strike> {
        let entity = self.live_mob(handle)?;
        let armor = self.world.get::<Armor>(entity).map_or(0.0, |a| a.0);
        let remaining = {
            let mut health = self.world.get_mut::<Health>(entity)?;
            health.current = (health.current - (damage - armor).max(1.0)).max(0.0);
            health.current
        };
        if remaining <= 0.0 {
            self.world.entity_mut(entity).insert(Dead);
            Some(Strike::Killed)
        } else {
            Some(Strike::Hurt { remaining })
        }
    }

    /// Live mobs within `radius` of `center`.
    pub fn mobs_near(&mut self, center: Vec3, radius: f32) -> Vec<EntityHandle> {
        let mut query = self
            .world
            .query_filtered::<(Entity, &Position), (With<Mob>, Without<Dead>)>();
        query
            .iter(&self.world)
            .filter(|(_, pos)| Vec3::from(**pos).distance(&center) <= radius)
            .map(|(entity, _)| EntityHandle(entity.to_bits()))
            .collect()
    }

    /// Despawn dead mobs, returning their handles.
    pub fn cleanup_dead(&mut self) -> Vec<EntityHandle> {
        let dead: Vec<Entity> = self
            .world
            .query_filtered::<Entity, (With<Mob>, With<Dead>)>()
            .iter(&self.world)
            .collect();
        for &entity in &dead {
            self.world.despawn(entity);
        }
        dead.into_iter().map(|e| EntityHandle(e.to_bits())).collect()
    }

    /// Move every mob with a brain toward the nearest player it can see.
    pub fn step_mobs(&mut self) {
        let targets: Vec<Vec3> = self.players().into_iter().map(|p| p.position).collect();
        if targets.is_empty() {
            return;
        }
        let mut query = self
            .world
            .query_filtered::<(&mut Position, &MovementSpeed, &Brain), (With<Mob>, Without<Dead>)>();
        for (mut pos, speed, brain) in query.iter_mut(&mut self.world) {
            let here = Vec3::from(*pos);
            let nearest = targets
                .iter()
                .map(|t| (here.distance_squared(t), t))
                .min_by(|a, b| a.0.total_cmp(&b.0));
            let Some((dist_sq, target)) = nearest else {
                continue;
            };
            let dist = dist_sq.sqrt();
            if dist > brain.aggro_range || dist < 1.5 {
                continue;
            }
            let step = speed.0.min(dist);
            pos.x += (target.x - here.x) / dist * step;
            pos.z += (target.z - here.z) / dist * step;
        }
    }

    pub fn mob_count(&mut self) -> usize {
        self.world
            .query_filtered::<Entity, (With<Mob>, Without<Dead>)>()
            .iter(&self.world)
            .count()
    }

    /// Kind of a live mob.
    pub fn mob_kind(&self, handle: EntityHandle) -> Option<MobKind> {
        let entity = self.live_mob(handle)?;
        self.world.get::<Kind>(entity).map(|k| k.0)
    }

    fn live_mob(&self, handle: EntityHandle) -> Option<Entity> {
        let entity = Entity::try_from_bits(handle.0).ok()?;
        self.world.get::<Mob>(entity)?;
        if self.world.get::<Dead>(entity).is_some() {
            return None;
        }
        Some(entity)
    }
}

impl EntityLifecycle for EcsEntities {
    fn spawn_entity(
        &mut self,
        kind: MobKind,
        position: Vec3,
        attributes: &SpawnAttributes,
    ) -> Result<EntityHandle, EntityError> {
        if self.mob_count() >= self.entity_limit {
            return Err(EntityError::LimitReached {
                limit: self.entity_limit,
            });
        }
        let entity = self
            .world
            .spawn((
                Position::from(position),
                Health {
                    current: attributes.max_health,
                    max: attributes.max_health,
                },
                Mob,
                Kind(kind),
                Level(attributes.level),
                AttackDamage(attributes.attack_damage),
                MovementSpeed(attributes.movement_speed),
                Armor(attributes.armor),
                DisplayName(attributes.display_name.clone()),
                AffixEffect(attributes.affix_behavior),
            ))
            .id();
        Ok(EntityHandle(entity.to_bits()))
    }

    fn entity_exists(&self, handle: EntityHandle) -> bool {
        self.live_mob(handle).is_some()
    }

    fn entity_position(&self, handle: EntityHandle) -> Option<Vec3> {
        let entity = self.live_mob(handle)?;
        self.world.get::<Position>(entity).map(|p| Vec3::from(*p))
    }

    fn nearby_player_within(&self, position: Vec3, radius: f32) -> bool {
        let r2 = radius * radius;
        self.players.values().any(|&entity| {
            self.world
                .get::<Position>(entity)
                .is_some_and(|p| Vec3::from(*p).distance_squared(&position) <= r2)
        })
    }

    fn despawn_entity(&mut self, handle: EntityHandle) {
        if let Ok(entity) = Entity::try_from_bits(handle.0) {
            if self.world.get::<Mob>(entity).is_some() {
                self.world.despawn(entity);
            }
        }
    }
}
