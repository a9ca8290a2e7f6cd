//! Flat world generator.
//!
//! The default layout:
//! - Y = 0: Bedrock
//! - Y = 1-2: Dirt
//! - Y = 3: Grass
//! - Y = 4+: Air (everything below Y = 0 is stone)

use crate::block::Block;
use crate::chunk::{ChunkColumn, MAX_Y, MIN_Y};

/// Stack of layers starting at `base_y`, bottom first.
#[derive(Debug, Clone)]
pub struct FlatLayers {
    pub base_y: i32,
    pub layers: Vec<(Block, u32)>,
    /// Block used for everything below `base_y`.
    pub filler: Block,
}

impl Default for FlatLayers {
    fn default() -> Self {
        Self {
            base_y: 0,
            layers: vec![(Block::Bedrock, 1), (Block::Dirt, 2), (Block::Grass, 1)],
            filler: Block::Stone,
        }
    }
}

impl FlatLayers {
    /// Block at world height `y` in every column.
    pub fn block_at(&self, y: i32) -> Block {
        if y < self.base_y {
            return self.filler;
        }
        let mut top = self.base_y;
        for &(block, count) in &self.layers {
            top += count as i32;
            if y < top {
                return block;
            }
        }
        Block::Air
    }

    /// First Y above the generated layers.
    pub fn surface_y(&self) -> i32 {
        self.base_y + self.layers.iter().map(|(_, c)| *c as i32).sum::<i32>()
    }
}

/// Generate a flat chunk column at the given chunk coordinates.
pub fn generate_flat_chunk(x: i32, z: i32, layers: &FlatLayers) -> ChunkColumn {
    let mut column = ChunkColumn::empty(x, z);
    let top = layers.surface_y().min(MAX_Y + 1);
    for y in MIN_Y..top {
        let block = layers.block_at(y);
        if block == Block::Air {
            continue;
        }
        for lx in 0..16 {
            for lz in 0..16 {
                column.set_block(lx, y, lz, block);
            }
        }
    }
    column
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_chunk_layer_layout() {
        let layers = FlatLayers::default();
        let col = generate_flat_chunk(0, 0, &layers);

        assert_eq!(col.get_block(0, -1, 0), Some(Block::Stone));
        assert_eq!(col.get_block(0, 0, 0), Some(Block::Bedrock));
        assert_eq!(col.get_block(0, 1, 0), Some(Block::Dirt));
        assert_eq!(col.get_block(0, 2, 0), Some(Block::Dirt));
        assert_eq!(col.get_block(15, 3, 15), Some(Block::Grass));
        assert_eq!(col.get_block(0, 4, 0), Some(Block::Air));
        assert_eq!(col.get_block(0, 200, 0), Some(Block::Air));
    }

    #[test]
    fn surface_height() {
        let layers = FlatLayers::default();
        assert_eq!(layers.surface_y(), 4);
        assert_eq!(layers.block_at(4), Block::Air);
        assert_eq!(layers.block_at(3), Block::Grass);
    }

    #[test]
    fn custom_layers() {
        let layers = FlatLayers {
            base_y: 10,
            layers: vec![(Block::Sand, 3), (Block::Water, 2)],
            filler: Block::Stone,
        };
        assert_eq!(layers.block_at(9), Block::Stone);
        assert_eq!(layers.block_at(12), Block::Sand);
        assert_eq!(layers.block_at(14), Block::Water);
        assert_eq!(layers.block_at(15), Block::Air);
    }
}
