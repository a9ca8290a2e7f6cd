//! World state consumed by the spawning core: blocks, chunks, light, and placement queries.

pub mod block;
pub mod chunk;
pub mod flat_generator;
pub mod level;
pub mod pos;
pub mod query;

pub use block::Block;
pub use level::Level;
pub use pos::{Aabb, Vec3};
pub use query::BlockAccess;
