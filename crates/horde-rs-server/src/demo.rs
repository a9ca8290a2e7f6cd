//! Simulated players that wander the zones and fight back.

use horde_rs_game::ecs::{EcsEntities, Strike};
use horde_rs_game::spawning::PlayerId;
use horde_rs_world::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::DemoSection;

/// Melee reach of a simulated player.
const ATTACK_RANGE: f32 = 4.0;

struct Walker {
    id: PlayerId,
    position: Vec3,
    heading: f32,
}

pub struct DemoPlayers {
    walkers: Vec<Walker>,
    walk_speed: f32,
    attack_damage: f32,
    attack_interval_ticks: u64,
    /// Inclusive Z range the walkers stay in.
    z_bounds: (f32, f32),
    rng: StdRng,
}

impl DemoPlayers {
    /// Place `cfg.players` walkers, one per zone starting at zone 1, and register
    /// them with the entity layer.
    pub fn spawn(
        cfg: &DemoSection,
        zone_count: u32,
        zone_depth: i32,
        surface_y: f32,
        seed: u64,
        entities: &mut EcsEntities,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let depth = zone_depth as f32;
        let zone_count = zone_count.max(1);
        let walkers: Vec<Walker> = (0..cfg.players)
            .map(|i| {
                let zone = 1 + i % zone_count;
                let position = Vec3::new(
                    rng.gen_range(-50.0..50.0),
                    surface_y,
                    zone as f32 * depth + depth / 2.0,
                );
                Walker {
                    id: PlayerId(i as u64 + 1),
                    position,
                    heading: rng.gen_range(0.0..std::f32::consts::TAU),
                }
            })
            .collect();
        for w in &walkers {
            entities.spawn_player(w.id, w.position, cfg.player_level);
        }
        debug!("Spawned {} simulated players", walkers.len());
        Self {
            walkers,
            walk_speed: cfg.walk_speed,
            attack_damage: cfg.attack_damage,
            attack_interval_ticks: cfg.attack_interval_ticks.max(1),
            z_bounds: (depth, (zone_count + 1) as f32 * depth - 1.0),
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.walkers.len()
    }

    /// Walk every player one tick and, on attack ticks, hit nearby mobs.
    pub fn step(&mut self, entities: &mut EcsEntities, tick: u64) {
        let attack = tick % self.attack_interval_ticks == 0;
        for w in &mut self.walkers {
            if self.rng.gen_bool(0.02) {
                w.heading += self.rng.gen_range(-1.0..1.0);
            }
            w.position.x += w.heading.cos() * self.walk_speed;
            w.position.z += w.heading.sin() * self.walk_speed;
            if w.position.z < self.z_bounds.0 || w.position.z > self.z_bounds.1 {
                w.heading = -w.heading;
                w.position.z = w.position.z.clamp(self.z_bounds.0, self.z_bounds.1);
            }
            entities.move_player(w.id, w.position);

            if attack {
                for handle in entities.mobs_near(w.position, ATTACK_RANGE) {
                    if let Some(Strike::Killed) = entities.strike(handle, self.attack_damage) {
                        debug!("Player {} killed a mob", w.id.0);
                    }
                }
            }
        }
    }
}
