//! Chunk and sub-chunk block storage.

use crate::block::Block;

/// Sub-chunks per column: Y range [-64, 319] = 384 blocks / 16 = 24.
pub const SUB_CHUNK_COUNT: usize = 24;

/// Minimum Y coordinate stored in a column.
pub const MIN_Y: i32 = -64;

/// Maximum Y coordinate stored in a column (inclusive).
pub const MAX_Y: i32 = MIN_Y + (SUB_CHUNK_COUNT as i32) * 16 - 1;

/// A 16x16x16 sub-chunk with a single palette-indexed storage layer.
#[derive(Clone)]
pub struct SubChunk {
    /// Palette indices for each block, stored in XZY order: `(x*16 + z)*16 + y`.
    blocks: [u16; 4096],
    palette: Vec<Block>,
}

impl SubChunk {
    /// Create a sub-chunk filled entirely with a single block.
    pub fn new_single(block: Block) -> Self {
        Self {
            blocks: [0; 4096],
            palette: vec![block],
        }
    }

    /// Set a block at local coordinates. `x`, `y`, `z` must each be in `[0, 15]`.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: Block) {
        debug_assert!(x < 16 && y < 16 && z < 16);
        let palette_index = match self.palette.iter().position(|&b| b == block) {
            Some(idx) => idx,
            None => {
                self.palette.push(block);
                self.palette.len() - 1
            }
        };
        self.blocks[(x * 16 + z) * 16 + y] = palette_index as u16;
    }

    pub fn get_block(&self, x: usize, y: usize, z: usize) -> Block {
        let palette_index = self.blocks[(x * 16 + z) * 16 + y] as usize;
        self.palette[palette_index]
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    /// True when every block in the sub-chunk is the same kind.
    pub fn is_uniform(&self) -> bool {
        self.palette.len() == 1
    }
}

/// A full 16-wide column of sub-chunks.
#[derive(Clone)]
pub struct ChunkColumn {
    pub x: i32,
    pub z: i32,
    pub sub_chunks: Vec<SubChunk>,
}

impl ChunkColumn {
    /// Column of air.
    pub fn empty(x: i32, z: i32) -> Self {
        Self {
            x,
            z,
            sub_chunks: (0..SUB_CHUNK_COUNT)
                .map(|_| SubChunk::new_single(Block::Air))
                .collect(),
        }
    }

    /// Block at local `x`/`z` in `[0, 15]` and world `y`. Outside the stored
    /// height range returns `None`.
    pub fn get_block(&self, x: usize, y: i32, z: usize) -> Option<Block> {
        let (index, local_y) = sub_chunk_index(y)?;
        Some(self.sub_chunks[index].get_block(x, local_y, z))
    }

    /// Set a block; writes outside the height range are dropped.
    pub fn set_block(&mut self, x: usize, y: i32, z: usize, block: Block) {
        if let Some((index, local_y)) = sub_chunk_index(y) {
            self.sub_chunks[index].set_block(x, local_y, z, block);
        }
    }

    /// Highest Y whose block is not air, if any.
    pub fn top_non_air(&self, x: usize, z: usize) -> Option<i32> {
        for (index, sub) in self.sub_chunks.iter().enumerate().rev() {
            if sub.is_uniform() && sub.get_block(0, 0, 0) == Block::Air {
                continue;
            }
            for local_y in (0..16).rev() {
                if sub.get_block(x, local_y, z) != Block::Air {
                    return Some(MIN_Y + (index as i32) * 16 + local_y as i32);
                }
            }
        }
        None
    }
}

fn sub_chunk_index(y: i32) -> Option<(usize, usize)> {
    if !(MIN_Y..=MAX_Y).contains(&y) {
        return None;
    }
    let offset = (y - MIN_Y) as usize;
    Some((offset / 16, offset % 16))
}
