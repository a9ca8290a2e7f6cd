//! Positions and axis-aligned boxes in world space.

use serde::Deserialize;

/// A point in world space (block units).
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Center of the block at integer coordinates, standing on its floor.
    pub fn block_center(x: i32, y: i32, z: i32) -> Self {
        Self::new(x as f32 + 0.5, y as f32, z as f32 + 0.5)
    }

    pub fn distance_squared(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Distance ignoring the Y axis.
    pub fn horizontal_distance(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Integer block coordinates containing this point.
    pub fn block_coords(&self) -> (i32, i32, i32) {
        (
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

/// Axis-aligned box, inclusive on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Build a box from two arbitrary corners.
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min: Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn contains(&self, p: &Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_3d() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 12.0);
        assert!((a.distance(&b) - 13.0).abs() < 1e-5);
        assert!((a.horizontal_distance(&b) - 12.369_317).abs() < 1e-4);
    }

    #[test]
    fn block_coords_floor_negative() {
        let p = Vec3::new(-0.5, 4.2, 15.9);
        assert_eq!(p.block_coords(), (-1, 4, 15));
    }

    #[test]
    fn aabb_contains_and_normalizes_corners() {
        let b = Aabb::from_corners(Vec3::new(10.0, 0.0, 10.0), Vec3::new(-10.0, 64.0, -10.0));
        assert!(b.contains(&Vec3::new(0.0, 5.0, 0.0)));
        assert!(b.contains(&Vec3::new(10.0, 64.0, -10.0)));
        assert!(!b.contains(&Vec3::new(10.5, 5.0, 0.0)));
        assert!(!b.contains(&Vec3::new(0.0, 65.0, 0.0)));
    }
}
