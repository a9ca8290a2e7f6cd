//! Spawn point search around a player.

use horde_rs_world::query::{ground_level_at, is_liquid_at};
use horde_rs_world::{BlockAccess, Vec3};
use rand::Rng;

use crate::settings::PlacementSettings;

/// Why individual candidate points were thrown away.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Rejections {
    pub no_ground: u32,
    pub liquid: u32,
    pub too_close: u32,
    pub protected: u32,
    pub too_bright: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementOutcome {
    pub position: Option<Vec3>,
    /// Candidates examined, at most `attempts`.
    pub attempts: u32,
    pub rejections: Rejections,
}

/// Pick a random point in the annulus `[min_radius, max_radius]` around `center`.
pub fn random_annulus_point(
    rng: &mut (impl Rng + ?Sized),
    center: Vec3,
    min_radius: f32,
    max_radius: f32,
) -> (f32, f32) {
    let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
    let dist: f32 = if max_radius > min_radius {
        rng.gen_range(min_radius..max_radius)
    } else {
        min_radius
    };
    (center.x + angle.cos() * dist, center.z + angle.sin() * dist)
}

/// Search for a valid spawn point near `center`.
///
/// Each attempt samples the annulus, resolves the ground, and rejects
/// liquid points, points within `min_player_distance` of `center`, points in a
/// protected area, and (when `check_light` is set) bright points with
/// probability `bright_rejection_chance`.
pub fn find_spawn_point(
    world: &impl BlockAccess,
    center: Vec3,
    min_radius: f32,
    max_radius: f32,
    rules: &PlacementSettings,
    check_light: bool,
    rng: &mut (impl Rng + ?Sized),
) -> PlacementOutcome {
    let mut rejections = Rejections::default();
    let start_y = center.y.floor() as i32;

    for attempt in 1..=rules.attempts {
        let (x, z) = random_annulus_point(rng, center, min_radius, max_radius);
        let (bx, bz) = (x.floor() as i32, z.floor() as i32);

        let Some(y) = ground_level_at(world, bx, bz, start_y) else {
            rejections.no_ground += 1;
            continue;
        };
        if is_liquid_at(world, bx, y, bz) {
            rejections.liquid += 1;
            continue;
        }
        let pos = Vec3::block_center(bx, y, bz);
        if pos.distance(&center) < rules.min_player_distance {
            rejections.too_close += 1;
            continue;
        }
        if rules.protected_areas.iter().any(|area| area.contains(&pos)) {
            rejections.protected += 1;
            continue;
        }
        if check_light
            && world.light_at(bx, y, bz) > rules.bright_light_threshold
            && rng.gen::<f64>() < rules.bright_rejection_chance
        {
            rejections.too_bright += 1;
            continue;
        }

        return PlacementOutcome {
            position: Some(pos),
            attempts: attempt,
            rejections,
        };
    }

    PlacementOutcome {
        position: None,
        attempts: rules.attempts,
        rejections,
    }
}
