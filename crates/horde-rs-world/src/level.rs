//! In-memory level: generated flat terrain plus stored edits.
//!
//! Columns are only materialized when something writes to them. Reads from
//! untouched columns fall through to the generator, so the level is infinite
//! in X/Z without storing anything.

use std::collections::HashMap;

use crate::block::Block;
use crate::chunk::{ChunkColumn, MAX_Y, MIN_Y};
use crate::flat_generator::{generate_flat_chunk, FlatLayers};
use crate::query::BlockAccess;

/// Full daylight.
pub const SKY_LIGHT_DAY: u8 = 15;
/// Moonlight.
pub const SKY_LIGHT_NIGHT: u8 = 4;

pub struct Level {
    columns: HashMap<(i32, i32), ChunkColumn>,
    layers: FlatLayers,
    sky_light: u8,
    emitters: HashMap<(i32, i32, i32), u8>,
}

impl Level {
    /// Create a flat level lit by daylight.
    pub fn flat(layers: FlatLayers) -> Self {
        Self {
            columns: HashMap::new(),
            layers,
            sky_light: SKY_LIGHT_DAY,
            emitters: HashMap::new(),
        }
    }

    pub fn layers(&self) -> &FlatLayers {
        &self.layers
    }

    /// First open Y above the generated terrain.
    pub fn surface_y(&self) -> i32 {
        self.layers.surface_y()
    }

    pub fn sky_light(&self) -> u8 {
        self.sky_light
    }

    pub fn set_sky_light(&mut self, level: u8) {
        self.sky_light = level.min(15);
    }

    /// Number of columns holding edits.
    pub fn stored_columns(&self) -> usize {
        self.columns.len()
    }

    /// Place a block, materializing its column from the generator if needed.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: Block) {
        if !(MIN_Y..=MAX_Y).contains(&y) {
            return;
        }
        let (cx, cz) = (x.div_euclid(16), z.div_euclid(16));
        let layers = &self.layers;
        let column = self
            .columns
            .entry((cx, cz))
            .or_insert_with(|| generate_flat_chunk(cx, cz, layers));
        column.set_block(x.rem_euclid(16) as usize, y, z.rem_euclid(16) as usize, block);

        let emission = block.light_emission();
        if emission > 0 {
            self.emitters.insert((x, y, z), emission);
        } else {
            self.emitters.remove(&(x, y, z));
        }
    }

    /// Fill the inclusive box between two corners.
    pub fn fill(&mut self, from: (i32, i32, i32), to: (i32, i32, i32), block: Block) {
        for x in from.0.min(to.0)..=from.0.max(to.0) {
            for y in from.1.min(to.1)..=from.1.max(to.1) {
                for z in from.2.min(to.2)..=from.2.max(to.2) {
                    self.set_block(x, y, z, block);
                }
            }
        }
    }

    fn column(&self, x: i32, z: i32) -> Option<&ChunkColumn> {
        self.columns.get(&(x.div_euclid(16), z.div_euclid(16)))
    }

    fn open_to_sky(&self, x: i32, y: i32, z: i32) -> bool {
        match self.column(x, z) {
            Some(col) => col
                .top_non_air(x.rem_euclid(16) as usize, z.rem_euclid(16) as usize)
                .is_none_or(|top| top < y),
            None => y >= self.layers.surface_y(),
        }
    }

    fn block_light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.emitters
            .iter()
            .map(|(&(ex, ey, ez), &emission)| {
                let dist = (ex - x).abs() + (ey - y).abs() + (ez - z).abs();
                (emission as i32 - dist).max(0) as u8
            })
            .max()
            .unwrap_or(0)
    }
}

impl BlockAccess for Level {
    fn block_at(&self, x: i32, y: i32, z: i32) -> Option<Block> {
        if !(MIN_Y..=MAX_Y).contains(&y) {
            return None;
        }
        match self.column(x, z) {
            Some(col) => col.get_block(x.rem_euclid(16) as usize, y, z.rem_euclid(16) as usize),
            None => Some(self.layers.block_at(y)),
        }
    }

    fn light_at(&self, x: i32, y: i32, z: i32) -> u8 {
        let sky = if self.open_to_sky(x, y, z) {
            self.sky_light
        } else {
            0
        };
        sky.max(self.block_light(x, y, z))
    }
}
