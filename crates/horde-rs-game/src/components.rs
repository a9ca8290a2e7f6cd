//! ECS components for players and mobs.

use bevy_ecs::prelude::*;
use horde_rs_world::Vec3;

use crate::affix::AffixBehavior;
use crate::mob_registry::MobKind;
use crate::spawning::PlayerId;

/// Position in the world.
#[derive(Component, Debug, Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Position {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Position> for Vec3 {
    fn from(p: Position) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// Health points.
#[derive(Component, Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// Marker: this entity is a mob.
#[derive(Component, Debug)]
pub struct Mob;

/// A connected player and its progression level.
#[derive(Component, Debug, Clone, Copy)]
pub struct Player {
    pub id: PlayerId,
    pub level: u32,
}

/// Marker: this entity is dead and waiting for cleanup.
#[derive(Component, Debug)]
pub struct Dead;

#[derive(Component, Debug, Clone, Copy)]
pub struct Kind(pub MobKind);

#[derive(Component, Debug, Clone, Copy)]
pub struct Level(pub u32);

#[derive(Component, Debug, Clone, Copy)]
pub struct AttackDamage(pub f32);

/// Base movement speed in blocks/tick.
#[derive(Component, Debug, Clone, Copy)]
pub struct MovementSpeed(pub f32);

/// Flat damage reduction.
#[derive(Component, Debug, Clone, Copy)]
pub struct Armor(pub f32);

/// Name shown above the mob, including any affix prefix.
#[derive(Component, Debug, Clone)]
pub struct DisplayName(pub String);

/// Special behavior granted by an affix.
#[derive(Component, Debug, Clone, Copy)]
pub struct AffixEffect(pub AffixBehavior);

/// Attached once by the behavior hook; mobs without it stay idle.
#[derive(Component, Debug, Clone, Copy)]
pub struct Brain {
    /// Distance at which the mob notices a player.
    pub aggro_range: f32,
}

impl Brain {
    /// Stronger mobs notice players from further away.
    pub fn for_level(level: u32) -> Self {
        Self {
            aggro_range: 16.0 + (level.min(40) as f32) * 0.5,
        }
    }
}
