//! Affix definitions and registry.
//!
//! An affix is a named modifier rolled onto a mob at spawn time. Definitions
//! are loaded once and shared by reference; mobs hold an `Arc<Affix>`.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::DataError;
use crate::zone::ZoneId;

/// Behavior hook an affix asks the entity layer to attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffixBehavior {
    #[default]
    None,
    Regenerate,
    IgniteOnHit,
    FreezeOnHit,
    ChainLightning,
    Lifesteal,
    DamageReflect,
    DeathPrevention,
    ManaDrain,
    CorruptionSpread,
}

fn one() -> f32 {
    1.0
}

/// A spawn-time modifier. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Affix {
    pub id: String,
    /// Prefix shown before the mob name, e.g. `"Swift"`.
    pub name: String,
    #[serde(default = "default_tier")]
    pub tier: u8,
    /// Relative selection weight among eligible affixes.
    pub weight: u32,
    /// Lowest zone the affix can appear in.
    pub min_zone: ZoneId,
    #[serde(default = "one")]
    pub health_multiplier: f32,
    #[serde(default = "one")]
    pub damage_multiplier: f32,
    #[serde(default = "one")]
    pub speed_multiplier: f32,
    #[serde(default)]
    pub armor_bonus: f32,
    #[serde(default = "one")]
    pub reward_multiplier: f32,
    #[serde(default)]
    pub loot_bonus: f32,
    #[serde(default)]
    pub behavior: AffixBehavior,
}

fn default_tier() -> u8 {
    1
}

impl Affix {
    /// Parse a single affix from JSON.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// All known affixes in registration order.
#[derive(Debug, Clone)]
pub struct AffixRegistry {
    affixes: Vec<Arc<Affix>>,
}

impl Default for AffixRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::too_many_arguments)]
fn builtin(
    id: &str,
    name: &str,
    tier: u8,
    weight: u32,
    min_zone: ZoneId,
    (health, damage, speed): (f32, f32, f32),
    armor_bonus: f32,
    (reward, loot): (f32, f32),
    behavior: AffixBehavior,
) -> Affix {
    Affix {
        id: id.into(),
        name: name.into(),
        tier,
        weight,
        min_zone,
        health_multiplier: health,
        damage_multiplier: damage,
        speed_multiplier: speed,
        armor_bonus,
        reward_multiplier: reward,
        loot_bonus: loot,
        behavior,
    }
}

impl AffixRegistry {
    /// Registry with the built-in affix set.
    pub fn new() -> Self {
        use AffixBehavior as B;
        let builtins = [
            builtin("swift", "Swift", 1, 100, 1, (0.9, 1.0, 1.4), 0.0, (1.2, 0.05), B::None),
            builtin("tough", "Tough", 1, 100, 1, (1.5, 1.0, 0.9), 4.0, (1.3, 0.1), B::None),
            builtin("aggressive", "Aggressive", 1, 80, 1, (1.0, 1.5, 1.1), 0.0, (1.4, 0.1), B::None),
            builtin("regenerating", "Regenerating", 2, 60, 3, (1.2, 1.0, 1.0), 0.0, (1.5, 0.15), B::Regenerate),
            builtin("burning", "Burning", 2, 70, 3, (1.1, 1.2, 1.0), 0.0, (1.4, 0.1), B::IgniteOnHit),
            builtin("frozen", "Frozen", 2, 70, 3, (1.2, 1.1, 0.8), 2.0, (1.4, 0.1), B::FreezeOnHit),
            builtin("electric", "Electric", 3, 50, 4, (1.0, 1.3, 1.2), 0.0, (1.5, 0.15), B::ChainLightning),
            builtin("vampiric", "Vampiric", 3, 40, 5, (1.3, 1.4, 1.1), 2.0, (1.8, 0.2), B::Lifesteal),
            builtin("mirror", "Mirror", 4, 30, 8, (1.2, 1.0, 1.0), 6.0, (2.0, 0.25), B::DamageReflect),
            builtin("immortal", "Immortal", 4, 20, 9, (2.0, 1.2, 0.9), 8.0, (2.5, 0.3), B::DeathPrevention),
            builtin("arcane", "Arcane", 4, 25, 9, (1.4, 1.6, 1.0), 4.0, (2.2, 0.25), B::ManaDrain),
            builtin("corrupting", "Corrupting", 5, 15, 10, (1.5, 1.5, 1.1), 5.0, (3.0, 0.35), B::CorruptionSpread),
        ];
        Self {
            affixes: builtins.into_iter().map(Arc::new).collect(),
        }
    }

    /// Empty registry; every roll yields no affix.
    pub fn empty() -> Self {
        Self {
            affixes: Vec::new(),
        }
    }

    /// Parse a JSON array of affixes.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let list: Vec<Affix> = serde_json::from_str(json)?;
        let mut registry = Self::empty();
        for affix in list {
            registry.register(affix)?;
        }
        Ok(registry)
    }

    /// Load a JSON array of affixes from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Add an affix. Ids must be unique.
    pub fn register(&mut self, affix: Affix) -> Result<(), DataError> {
        if self.get(&affix.id).is_some() {
            return Err(DataError::DuplicateAffix(affix.id));
        }
        self.affixes.push(Arc::new(affix));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Affix>> {
        self.affixes.iter().find(|a| a.id == id)
    }

    pub fn all(&self) -> &[Arc<Affix>] {
        &self.affixes
    }

    pub fn len(&self) -> usize {
        self.affixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.affixes.is_empty()
    }
}
