//! Read-only world queries used by spawn placement.

use crate::block::Block;
use crate::chunk::{MAX_Y, MIN_Y};

/// Read access to blocks and light at world coordinates.
///
/// `block_at` returns `None` outside the loaded/stored height range.
pub trait BlockAccess {
    fn block_at(&self, x: i32, y: i32, z: i32) -> Option<Block>;

    /// Combined sky and block light, `0..=15`.
    fn light_at(&self, x: i32, y: i32, z: i32) -> u8;

    /// Inclusive `(min_y, max_y)` of the world.
    fn height_range(&self) -> (i32, i32) {
        (MIN_Y, MAX_Y)
    }
}

/// A solid block at `y` with two non-solid blocks above it.
pub fn is_standable(world: &impl BlockAccess, x: i32, y: i32, z: i32) -> bool {
    let floor = match world.block_at(x, y, z) {
        Some(b) => b,
        None => return false,
    };
    if !floor.is_solid() {
        return false;
    }
    let clear = |dy: i32| matches!(world.block_at(x, y + dy, z), Some(b) if !b.is_solid());
    clear(1) && clear(2)
}

/// Find the feet Y of the nearest standable spot in column `(x, z)`.
///
/// Scans downward from `start_y` first, then upward. Returns the Y of the first
/// non-solid block above the ground, or `None` when the column has no spot.
pub fn ground_level_at(world: &impl BlockAccess, x: i32, z: i32, start_y: i32) -> Option<i32> {
    let (min_y, max_y) = world.height_range();
    let start = start_y.clamp(min_y, max_y);

    for y in (min_y..=start).rev() {
        if is_standable(world, x, y, z) {
            return Some(y + 1);
        }
    }
    for y in (start + 1)..=max_y {
        if is_standable(world, x, y, z) {
            return Some(y + 1);
        }
    }
    None
}

pub fn is_liquid_at(world: &impl BlockAccess, x: i32, y: i32, z: i32) -> bool {
    world.block_at(x, y, z).is_some_and(Block::is_liquid)
}
