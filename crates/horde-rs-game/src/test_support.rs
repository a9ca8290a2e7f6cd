//! In-memory entity layer for unit tests.

use std::collections::BTreeMap;

use horde_rs_world::Vec3;

use crate::error::EntityError;
use crate::hooks::{EntityHandle, EntityLifecycle, SpawnAttributes};
use crate::mob_registry::MobKind;

#[derive(Default)]
pub struct MockEntities {
    players: Vec<Vec3>,
    entities: BTreeMap<EntityHandle, Vec3>,
    next: u64,
    pub spawned: Vec<(EntityHandle, MobKind, Vec3, SpawnAttributes)>,
    pub reject_spawns: bool,
}

impl MockEntities {
    pub fn new() -> Self {
        Self {
            next: 1,
            ..Default::default()
        }
    }

    pub fn add_player(&mut self, pos: Vec3) {
        self.players.push(pos);
    }

    pub fn insert_entity(&mut self, pos: Vec3) -> EntityHandle {
        let handle = EntityHandle(self.next);
        self.next += 1;
        self.entities.insert(handle, pos);
        handle
    }

    pub fn remove_entity(&mut self, handle: EntityHandle) {
        self.entities.remove(&handle);
    }

    pub fn move_entity(&mut self, handle: EntityHandle, pos: Vec3) {
        if let Some(e) = self.entities.get_mut(&handle) {
            *e = pos;
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl EntityLifecycle for MockEntities {
    fn spawn_entity(
        &mut self,
        kind: MobKind,
        position: Vec3,
        attributes: &SpawnAttributes,
    ) -> Result<EntityHandle, EntityError> {
        if self.reject_spawns {
            return Err(EntityError::SpawnRejected {
                kind,
                reason: "rejected by test".into(),
            });
        }
        let handle = self.insert_entity(position);
        self.spawned.push((handle, kind, position, attributes.clone()));
        Ok(handle)
    }

    fn entity_exists(&self, handle: EntityHandle) -> bool {
        self.entities.contains_key(&handle)
    }

    fn entity_position(&self, handle: EntityHandle) -> Option<Vec3> {
        self.entities.get(&handle).copied()
    }

    fn nearby_player_within(&self, position: Vec3, radius: f32) -> bool {
        self.players
            .iter()
            .any(|p| p.distance_squared(&position) <= radius * radius)
    }

    fn despawn_entity(&mut self, handle: EntityHandle) {
        self.entities.remove(&handle);
    }
}
