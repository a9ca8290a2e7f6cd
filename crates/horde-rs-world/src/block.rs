//! Block kinds and the properties placement cares about.
//!
//! Every block carries solidity, liquidity, and the light level it emits.
//! Unknown block names parse to `None`.

use serde::Deserialize;

/// A block kind stored in chunk palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    Air,
    Bedrock,
    Stone,
    Dirt,
    Grass,
    Sand,
    Gravel,
    Log,
    Leaves,
    Water,
    Lava,
    Torch,
    Glowstone,
    Lantern,
}

/// Properties for a single block kind.
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub block: Block,
    pub name: &'static str,
    /// Whether entities can stand on (and collide with) this block.
    pub is_solid: bool,
    pub is_liquid: bool,
    /// Light level emitted, `0..=15`.
    pub light_emission: u8,
}

macro_rules! block {
    ($block:ident, $name:expr, solid, $light:expr) => {
        BlockInfo {
            block: Block::$block,
            name: $name,
            is_solid: true,
            is_liquid: false,
            light_emission: $light,
        }
    };
    ($block:ident, $name:expr, non_solid, $light:expr) => {
        BlockInfo {
            block: Block::$block,
            name: $name,
            is_solid: false,
            is_liquid: false,
            light_emission: $light,
        }
    };
    ($block:ident, $name:expr, liquid, $light:expr) => {
        BlockInfo {
            block: Block::$block,
            name: $name,
            is_solid: false,
            is_liquid: true,
            light_emission: $light,
        }
    };
}

/// Indexed by `Block as usize`.
static BLOCK_DATA: &[BlockInfo] = &[
    block!(Air, "air", non_solid, 0),
    block!(Bedrock, "bedrock", solid, 0),
    block!(Stone, "stone", solid, 0),
    block!(Dirt, "dirt", solid, 0),
    block!(Grass, "grass", solid, 0),
    block!(Sand, "sand", solid, 0),
    block!(Gravel, "gravel", solid, 0),
    block!(Log, "log", solid, 0),
    block!(Leaves, "leaves", solid, 0),
    block!(Water, "water", liquid, 0),
    block!(Lava, "lava", liquid, 15),
    block!(Torch, "torch", non_solid, 14),
    block!(Glowstone, "glowstone", solid, 15),
    block!(Lantern, "lantern", solid, 15),
];

impl Block {
    pub fn info(self) -> &'static BlockInfo {
        &BLOCK_DATA[self as usize]
    }

    pub fn is_solid(self) -> bool {
        self.info().is_solid
    }

    pub fn is_liquid(self) -> bool {
        self.info().is_liquid
    }

    pub fn light_emission(self) -> u8 {
        self.info().light_emission
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Look up a block by its name, e.g. `"stone"`.
    pub fn from_name(name: &str) -> Option<Block> {
        BLOCK_DATA.iter().find(|b| b.name == name).map(|b| b.block)
    }
}
