//! Hostile mob spawning: zones, weighted selection, affixes, population
//! tracking, steady-state scheduling, and horde bursts.

pub mod affix;
pub mod affix_roller;
pub mod components;
pub mod director;
pub mod ecs;
pub mod error;
pub mod hooks;
pub mod mob_registry;
pub mod population;
pub mod selector;
pub mod settings;
pub mod spawning;
pub mod task_queue;
pub mod zone;

#[cfg(test)]
mod test_support;
