//! Seams between the spawning core and the entity layer it drives.

use std::sync::Arc;

use horde_rs_world::Vec3;

use crate::affix::{Affix, AffixBehavior};
use crate::error::EntityError;
use crate::mob_registry::{MobDefinition, MobKind};

/// Opaque handle to a live entity owned by the entity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub u64);

/// Final stats handed to the entity layer for a new mob.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnAttributes {
    pub level: u32,
    pub max_health: f32,
    pub attack_damage: f32,
    pub movement_speed: f32,
    pub armor: f32,
    /// Display name including the affix prefix, e.g. `"Swift Runner"`.
    pub display_name: String,
    pub affix_behavior: AffixBehavior,
}

impl SpawnAttributes {
    /// Base stats of a kind at a level.
    pub fn from_definition(def: &MobDefinition, level: u32) -> Self {
        Self {
            level,
            max_health: def.max_health,
            attack_damage: def.attack_damage,
            movement_speed: def.movement_speed,
            armor: 0.0,
            display_name: def.display_name.to_string(),
            affix_behavior: AffixBehavior::None,
        }
    }

    /// Apply affix multipliers and name prefixes in roll order. The first
    /// affix with a special behavior provides it.
    pub fn with_affixes(mut self, affixes: &[Arc<Affix>]) -> Self {
        let mut prefixes = Vec::with_capacity(affixes.len() + 1);
        for affix in affixes {
            self.max_health *= affix.health_multiplier;
            self.attack_damage *= affix.damage_multiplier;
            self.movement_speed *= affix.speed_multiplier;
            self.armor += affix.armor_bonus;
            prefixes.push(affix.name.as_str());
            if self.affix_behavior == AffixBehavior::None {
                self.affix_behavior = affix.behavior;
            }
        }
        if !prefixes.is_empty() {
            prefixes.push(&self.display_name);
            self.display_name = prefixes.join(" ");
        }
        self
    }
}

/// Entity creation and lookup. Implemented by the world that owns mobs.
pub trait EntityLifecycle {
    fn spawn_entity(
        &mut self,
        kind: MobKind,
        position: Vec3,
        attributes: &SpawnAttributes,
    ) -> Result<EntityHandle, EntityError>;

    /// Whether the entity is still alive and loaded.
    fn entity_exists(&self, handle: EntityHandle) -> bool;

    /// Current position, `None` when the entity is gone.
    fn entity_position(&self, handle: EntityHandle) -> Option<Vec3>;

    /// Whether any player stands within `radius` of `position`.
    fn nearby_player_within(&self, position: Vec3, radius: f32) -> bool;

    /// Remove an entity. Unknown handles are ignored.
    fn despawn_entity(&mut self, handle: EntityHandle);
}

/// Behavior attachment, called exactly once per successful spawn.
pub trait BehaviorHook {
    fn attach_behavior(&mut self, handle: EntityHandle, kind: MobKind, level: u32);
}

/// Hook that attaches nothing.
pub struct NoBehavior;

impl BehaviorHook for NoBehavior {
    fn attach_behavior(&mut self, _handle: EntityHandle, _kind: MobKind, _level: u32) {}
}

/// A behavior attachment waiting to be applied by the entity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorRequest {
    pub handle: EntityHandle,
    pub kind: MobKind,
    pub level: u32,
}

/// Hook that queues attachments so the entity layer can apply them after the
/// tick, when it is no longer borrowed by the spawner.
#[derive(Debug, Default)]
pub struct BehaviorQueue {
    pending: Vec<BehaviorRequest>,
}

impl BehaviorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = BehaviorRequest> + '_ {
        self.pending.drain(..)
    }

    pub fn pending(&self) -> &[BehaviorRequest] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl BehaviorHook for BehaviorQueue {
    fn attach_behavior(&mut self, handle: EntityHandle, kind: MobKind, level: u32) {
        self.pending.push(BehaviorRequest {
            handle,
            kind,
            level,
        });
    }
}
